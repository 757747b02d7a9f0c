pub const APP_NAME: &str = "xdeps";

/// Environment variable overriding the configured work directory.
pub const WORK_DIR_ENV: &str = "XDEPS_WORK_DIR";

/// Written into an extracted source tree once extraction and patching both finished.
pub const SOURCE_READY_MARKER: &str = ".xdeps-ready";

/// Suffix of in-flight downloads. Never trusted as a finished archive.
pub const PARTIAL_DOWNLOAD_SUFFIX: &str = ".part";

pub const LOCK_FILENAME: &str = ".lock";

/// Timeout for a single mirror attempt, in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 300;

pub const FETCH_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Lines of captured stdout kept in an error report.
pub const DIAGNOSTIC_TAIL_LINES: usize = 40;
