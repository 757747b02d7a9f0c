//! The built-in project table.
//!
//! Declaration order is build order: codecs first, then the libraries that
//! can link against them.

use thiserror::Error;

use crate::backend::{AutotoolsOptions, Backend};
use crate::manifest::{Manifest, ManifestError};
use crate::project::{Edit, Project, ProjectError};

#[derive(Debug, Error)]
pub enum LibsError {
  #[error(transparent)]
  Project(#[from] ProjectError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),
}

const STATIC: [&str; 2] = ["--disable-shared", "--enable-static"];

/// Every known project, in build order.
pub fn all() -> Result<Manifest, LibsError> {
  let projects = vec![
    libmpdclient()?,
    libogg()?,
    opus()?,
    flac()?,
    zlib()?,
    libid3tag()?,
    libmad()?,
    lame()?,
    libmodplug()?,
    libopenmpt()?,
    wildmidi()?,
    gme()?,
    ffmpeg()?,
    openssl()?,
    libnfs()?,
    jack()?,
    boost()?,
  ];
  Ok(Manifest::new(projects)?)
}

fn libmpdclient() -> Result<Project, ProjectError> {
  Project::new(
    &["https://www.musicpd.org/download/libmpdclient/2/libmpdclient-2.20.tar.xz"],
    "18793f68e939c3301e34d8fcadea1f7daa24143941263cecadb80126194e277d",
    "lib/libmpdclient.a",
    Backend::Meson,
  )
}

fn libogg() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["http://downloads.xiph.org/releases/ogg/libogg-1.3.5.tar.xz"],
      "c4d91be36fc8e54deae7575241e03f4211eb102afb3fc0775fbbc1b740016705",
      "lib/libogg.a",
      Backend::Cmake,
    )?
    .configure_args([
      "-DBUILD_SHARED_LIBS=OFF",
      "-DINSTALL_DOCS=OFF",
      "-DINSTALL_CMAKE_PACKAGE_MODULE=OFF",
    ]),
  )
}

fn opus() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["https://downloads.xiph.org/releases/opus/opus-1.4.tar.gz"],
      "c9b32b4253be5ae63d1ff16eea06b94b5f0f2951b7a02aceef58e3a3ce49c51f",
      "lib/libopus.a",
      Backend::autotools(),
    )?
    .configure_args(STATIC)
    .configure_args(["--disable-doc", "--disable-extra-programs"])
    // suppress "visibility default" from opus_defines.h
    .cppflags("-DOPUS_EXPORT="),
  )
}

fn flac() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["http://downloads.xiph.org/releases/flac/flac-1.4.3.tar.xz"],
      "6c58e69cd22348f441b861092b825e591d0b822e106de6eb0ee4d05d27205b70",
      "lib/libFLAC.a",
      Backend::Autotools(AutotoolsOptions::subdirs(&["include", "src/libFLAC"])),
    )?
    .configure_args(STATIC)
    .configure_args([
      "--disable-stack-smash-protection",
      "--disable-xmms-plugin",
      "--disable-cpplibs",
      "--disable-doxygen-docs",
      "--disable-programs",
    ])
    .requires(&["libogg"]),
  )
}

fn zlib() -> Result<Project, ProjectError> {
  Project::new(
    &[
      "http://zlib.net/zlib-1.3.1.tar.xz",
      "https://github.com/madler/zlib/releases/download/v1.3.1/zlib-1.3.1.tar.xz",
    ],
    "38ef96b8dfe510d42707d9c781877914792541133e1870841463bfa73f883e32",
    "lib/libz.a",
    Backend::Zlib,
  )
}

/// libid3tag's configure.ac keeps only the last optimization flag.
fn keep_all_optimize_flags(data: &str) -> String {
  data.replacen(r#"optimize="$1""#, r#"optimize="$optimize $1""#, 1)
}

fn libid3tag() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["ftp://ftp.mars.org/pub/mpeg/libid3tag-0.15.1b.tar.gz"],
      "e5808ad997ba32c498803822078748c3",
      "lib/libid3tag.a",
      Backend::Autotools(AutotoolsOptions::autogen()),
    )?
    .configure_args(STATIC)
    // otherwise configure.ac ignores -O* and -f*
    .configure_args(["--disable-debugging"])
    .edits(vec![Edit::new("configure.ac", keep_all_optimize_flags)])
    .requires(&["libz"]),
  )
}

fn libmad() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["ftp://ftp.mars.org/pub/mpeg/libmad-0.15.1b.tar.gz"],
      "1be543bc30c56fb6bea1d7bf6a64e66c",
      "lib/libmad.a",
      Backend::Autotools(AutotoolsOptions::autogen()),
    )?
    .configure_args(STATIC)
    .configure_args(["--disable-debugging"]),
  )
}

fn lame() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["http://downloads.sourceforge.net/project/lame/lame/3.100/lame-3.100.tar.gz"],
      "ddfe36cab873794038ae2c1210557ad34857a4b6bdc515785d1da9e175b1da1e",
      "lib/libmp3lame.a",
      Backend::autotools(),
    )?
    .configure_args(STATIC)
    .configure_args([
      "--disable-gtktest",
      "--disable-analyzer-hooks",
      "--disable-decoder",
      "--disable-frontend",
    ]),
  )
}

fn libmodplug() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["https://downloads.sourceforge.net/modplug-xmms/libmodplug/0.8.9.0/libmodplug-0.8.9.0.tar.gz"],
      "457ca5a6c179656d66c01505c0d95fafaead4329b9dbaa0f997d00a3508ad9de",
      "lib/libmodplug.a",
      Backend::autotools(),
    )?
    .configure_args(STATIC)
    .patch_dir("src/lib/modplug/patches"),
  )
}

fn libopenmpt() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["https://lib.openmpt.org/files/libopenmpt/src/libopenmpt-0.7.9+release.autotools.tar.gz"],
      "0386e918d75d797e79d5b14edd0847165d8b359e9811ef57652c0a356a2dfcf4",
      "lib/libopenmpt.a",
      Backend::autotools(),
    )?
    .configure_args(STATIC)
    .configure_args([
      "--disable-openmpt123",
      "--disable-examples",
      "--disable-tests",
      "--disable-doxygen-doc",
      "--without-mpg123",
      "--without-ogg",
      "--without-vorbis",
      "--without-vorbisfile",
      "--without-portaudio",
      "--without-portaudiocpp",
      "--without-sndfile",
      "--without-flac",
    ])
    .base("libopenmpt-0.7.9+release.autotools"),
  )
}

fn wildmidi() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["https://github.com/Mindwerks/wildmidi/releases/download/wildmidi-0.4.6/wildmidi-0.4.6.tar.gz"],
      "24ca992639ce76efa3737029fceb3672385d56e2ac0a15d50b40cc12d26e60de",
      "lib/libWildMidi.a",
      Backend::Cmake,
    )?
    .configure_args(["-DBUILD_SHARED_LIBS=OFF", "-DWANT_PLAYER=OFF", "-DWANT_STATIC=ON"]),
  )
}

fn gme() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["https://bitbucket.org/mpyne/game-music-emu/downloads/game-music-emu-0.6.3.tar.xz"],
      "aba34e53ef0ec6a34b58b84e28bf8cfbccee6585cebca25333604c35db3e051d",
      "lib/libgme.a",
      Backend::Cmake,
    )?
    .configure_args([
      "-DBUILD_SHARED_LIBS=OFF",
      "-DENABLE_UBSAN=OFF",
      "-DZLIB_INCLUDE_DIR=OFF",
      "-DCMAKE_DISABLE_FIND_PACKAGE_SDL2=ON",
    ]),
  )
}

const FFMPEG_OPTIONS: &[&str] = &[
  "--disable-shared", "--enable-static", "--enable-gpl",
  "--enable-small", "--disable-pthreads", "--disable-programs",
  "--disable-doc", "--disable-avdevice", "--disable-swresample",
  "--disable-swscale", "--disable-postproc", "--disable-avfilter",
  "--disable-faan", "--disable-pixelutils", "--disable-network",
  "--disable-encoders", "--disable-hwaccels", "--disable-muxers",
  "--disable-protocols", "--disable-devices", "--disable-filters",
  "--disable-v4l2_m2m", "--disable-sdl2", "--disable-vulkan",
  "--disable-xlib",
];

const FFMPEG_DISABLED_PARSERS: &[&str] = &[
  "bmp", "cavsvideo", "dvbsub", "dvdsub", "dvd_nav", "flac",
  "g729", "gsm", "h261", "h263", "h264", "hevc",
  "jpeg2000", "mjpeg", "mlp", "mpeg4video", "mpegvideo", "opus",
  "qoi", "rv30", "rv40", "vc1", "vp3", "vp8",
  "vp9", "png", "pnm", "webp", "xma",
];

const FFMPEG_DISABLED_DEMUXERS: &[&str] = &[
  "aqtitle", "ass", "bethsoftvid", "bink", "cavsvideo", "cdxl",
  "dvbsub", "dvbtxt", "h261", "h263", "h264", "ico",
  "image2", "image2pipe", "image_bmp_pipe", "image_cri_pipe", "image_dds_pipe", "image_dpx_pipe",
  "image_exr_pipe", "image_gem_pipe", "image_gif_pipe", "image_j2k_pipe", "image_jpeg_pipe", "image_jpegls_pipe",
  "image_jpegxl_pipe", "image_pam_pipe", "image_pbm_pipe", "image_pcx_pipe", "image_pfm_pipe", "image_pgm_pipe",
  "image_pgmyuv_pipe", "image_pgx_pipe", "image_phm_pipe", "image_photocd_pipe", "image_pictor_pipe", "image_png_pipe",
  "image_ppm_pipe", "image_psd_pipe", "image_qdraw_pipe", "image_qoi_pipe", "image_sgi_pipe", "image_sunrast_pipe",
  "image_svg_pipe", "image_tiff_pipe", "image_vbn_pipe", "image_webp_pipe", "image_xbm_pipe", "image_xpm_pipe",
  "image_xwd_pipe", "jacosub", "lrc", "microdvd", "mjpeg", "mjpeg_2000",
  "mpegps", "mpegvideo", "mpl2", "mpsub", "pjs", "rawvideo",
  "realtext", "sami", "scc", "srt", "stl", "subviewer",
  "subviewer1", "swf", "tedcaptions", "vobsub", "vplayer", "webm_dash_manifest",
  "webvtt", "yuv4mpegpipe",
];

const FFMPEG_DISABLED_DECODERS: &[&str] = &[
  "flac", "opus", "vorbis", "atrac1", "atrac3", "atrac3al",
  "atrac3p", "atrac3pal", "binkaudio_dct", "binkaudio_rdft", "bmv_audio", "dsicinaudio",
  "dvaudio", "metasound", "paf_audio", "ra_144", "ra_288", "ralf",
  "qdm2", "qdmc", "acelp_kelvin", "agm", "aic", "alias_pix",
  "ansi", "apng", "arbc", "argo", "ass", "asv1",
  "asv2", "aura", "aura2", "avrn", "avrp", "avui",
  "ayuv", "bethsoftvid", "bfi", "bink", "bintext", "bitpacked",
  "bmp", "bmv_video", "brender_pix", "c93", "cavs", "ccaption",
  "cdgraphics", "cdtoons", "cdxl", "cfhd", "cinepak", "clearvideo",
  "cljr", "cllc", "cpia", "cscd", "cyuv", "dds",
  "dirac", "dnxhd", "dpx", "dsicinvideo", "dvbsub", "dvdsub",
  "dvvideo", "dxa", "dxtory", "dxv", "eacmv", "eamad",
  "eatgq", "eatgv", "eatqi", "eightbps", "escape124", "escape130",
  "exr", "ffv1", "ffvhuff", "ffwavesynth", "fic", "fits",
  "flashsv", "flashsv2", "flic", "flv", "fmvc", "fraps",
  "fourxm", "frwu", "g2m", "gdv", "gem", "gif",
  "h261", "h263", "h263i", "h263p", "h264", "hap",
  "hevc", "hnm4_video", "hq_hqa", "hqx", "huffyuv", "hymt",
  "idcin", "idf", "iff_ilbm", "imm4", "indeo2", "indeo3",
  "indeo4", "indeo5", "interplay_video", "ipu", "jacosub", "jpeg2000",
  "jpegls", "jv", "kgv1", "kmvc", "lagarith", "lead",
  "loco", "lscr", "m101", "magicyuv", "mdec", "microdvd",
  "mimic", "mjpeg", "mmvideo", "mpl2", "mobiclip", "motionpixels",
  "movtext", "mpeg1video", "mpeg2video", "mpeg4", "mpegvideo", "msa1",
  "mscc", "msmpeg4_crystalhd", "msmpeg4v1", "msmpeg4v2", "msmpeg4v3", "msp2",
  "msrle", "mss1", "msvideo1", "mszh", "mts2", "mv30",
  "mvc1", "mvc2", "mvdv", "mvha", "mwsc", "notchlc",
  "nuv", "on2avc", "paf_video", "pam", "pbm", "pcx",
  "pdv", "pfm", "pgm", "pgmyuv", "pgssub", "pgx",
  "phm", "photocd", "png", "pictor", "pixlet", "pjs",
  "ppm", "prores", "prosumer", "psd", "ptx", "qdraw",
  "qoi", "qpeg", "qtrle", "rawvideo", "r10k", "r210",
  "rasc", "realtext", "rl2", "rpza", "roq", "roq_dpcm",
  "rscc", "rv10", "rv20", "rv30", "rv40", "sami",
  "sanm", "scpr", "screenpresso", "sga", "sgi", "sgirle",
  "sheervideo", "simbiosis_imx", "smc", "snow", "speedhq", "srgc",
  "srt", "ssa", "stl", "subrip", "subviewer", "subviewer1",
  "sunrast", "svq1", "svq3", "targa", "targa_y216", "text",
  "tiff", "tiertexseqvideo", "tmv", "truemotion1", "truemotion2", "truemotion2rt",
  "tscc", "tscc2", "twinvq", "txd", "ulti", "utvideo",
  "v210", "v210x", "v308", "v408", "v410", "vb",
  "vble", "vbn", "vc1", "vcr1", "vmdvideo", "vmnc",
  "vp3", "vp5", "vp6", "vp7", "vp8", "vp9",
  "vplayer", "vqa", "webvtt", "wcmv", "wmv1", "wmv2",
  "wmv3", "wnv1", "wrapped_avframe", "xan_wc3", "xan_wc4", "xbin",
  "xbm", "xface", "xl", "xpm", "xsub", "xwd",
  "y41p", "ylc", "yop", "yuv4", "zero12v", "zerocodec",
  "zlib", "zmbv",
];

const FFMPEG_DISABLED_BSFS: &[&str] = &[
  "av1_frame_merge", "av1_frame_split", "av1_metadata",
  "dts2pts", "h264_metadata", "h264_mp4toannexb",
  "h264_redundant_pps", "hevc_metadata", "hevc_mp4toannexb",
  "mjpeg2jpeg", "opus_metadata", "pgs_frame_merge",
  "text2movsub", "vp9_metadata", "vp9_raw_reorder",
  "vp9_superframe", "vp9_superframe_split",
];

/// `--disable-<kind>=<name>` for every name.
fn disable_each(kind: &'static str, names: &'static [&'static str]) -> impl Iterator<Item = String> {
  names.iter().map(move |name| format!("--disable-{kind}={name}"))
}

fn ffmpeg() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["http://ffmpeg.org/releases/ffmpeg-7.1.tar.xz"],
      "40973d44970dbc83ef302b0609f2e74982be2d85916dd2ee7472d30678a7abe6",
      "lib/libavcodec.a",
      Backend::Ffmpeg,
    )?
    .configure_args(FFMPEG_OPTIONS.iter().copied())
    .configure_args(disable_each("parser", FFMPEG_DISABLED_PARSERS))
    .configure_args(disable_each("demuxer", FFMPEG_DISABLED_DEMUXERS))
    .configure_args(disable_each("decoder", FFMPEG_DISABLED_DECODERS))
    .configure_args(disable_each("bsf", FFMPEG_DISABLED_BSFS)),
  )
}

fn openssl() -> Result<Project, ProjectError> {
  Project::new(
    &[
      "https://www.openssl.org/source/openssl-3.1.4.tar.gz",
      "https://artfiles.org/openssl.org/source/openssl-3.1.4.tar.gz",
    ],
    "840af5366ab9b522bde525826be3ef0fb0af81c6a9ebd84caa600fea1731eee3",
    "include/openssl/ossl_typ.h",
    Backend::OpenSsl,
  )
}

fn libnfs() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["https://github.com/sahlberg/libnfs/archive/libnfs-5.0.3.tar.gz"],
      "d945cb4f4c8f82ee1f3640893a168810f794a28e1010bb007ec5add345e9df3e",
      "lib/libnfs.a",
      Backend::Autotools(AutotoolsOptions::autoreconf()),
    )?
    .configure_args(STATIC)
    .configure_args([
      "--disable-debug",
      // -Wtautological-compare
      "--disable-werror",
      "--disable-utils",
      "--disable-examples",
    ])
    .base("libnfs-libnfs-5.0.3"),
  )
}

fn jack() -> Result<Project, ProjectError> {
  Ok(
    Project::new(
      &["https://github.com/jackaudio/jack2/archive/v1.9.17.tar.gz"],
      "38f674bbc57852a8eb3d9faa1f96a0912d26f7d5df14c11005ad499c8ae352f2",
      "lib/pkgconfig/jack.pc",
      Backend::Jack,
    )?
    .base("jack2-1.9.17"),
  )
}

fn boost() -> Result<Project, ProjectError> {
  Project::new(
    &["https://boostorg.jfrog.io/artifactory/main/release/1.81.0/source/boost_1_81_0.tar.bz2"],
    "71feeed900fbccca04a3b4f2f84a7c217186f28a940ed8b7ed4725986baf99fa",
    "include/boost/version.hpp",
    Backend::Boost,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::digest::DigestAlgorithm;
  use crate::project::PatchSpec;

  #[test]
  fn table_is_complete_and_ordered() {
    let manifest = all().unwrap();
    let names: Vec<_> = manifest.projects().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
      names,
      [
        "libmpdclient",
        "libogg",
        "libopus",
        "libFLAC",
        "libz",
        "libid3tag",
        "libmad",
        "libmp3lame",
        "libmodplug",
        "libopenmpt",
        "libWildMidi",
        "libgme",
        "libavcodec",
        "openssl",
        "libnfs",
        "jack",
        "boost",
      ]
    );
  }

  #[test]
  fn legacy_tarballs_pin_md5() {
    let manifest = all().unwrap();
    for name in ["libid3tag", "libmad"] {
      assert_eq!(manifest.get(name).unwrap().digest.algorithm, DigestAlgorithm::Md5);
    }
    assert_eq!(manifest.get("libz").unwrap().urls.len(), 2);
  }

  #[test]
  fn source_dirs_match_archive_layout() {
    let manifest = all().unwrap();
    assert_eq!(manifest.get("jack").unwrap().base_dir_name(), "jack2-1.9.17");
    assert_eq!(manifest.get("libnfs").unwrap().base_dir_name(), "libnfs-libnfs-5.0.3");
    assert_eq!(manifest.get("boost").unwrap().base_dir_name(), "boost_1_81_0");
    assert_eq!(manifest.get("libavcodec").unwrap().base_dir_name(), "ffmpeg-7.1");
  }

  #[test]
  fn ffmpeg_disables_are_expanded() {
    let manifest = all().unwrap();
    let args = &manifest.get("libavcodec").unwrap().configure_args;
    assert!(args.contains(&"--disable-parser=bmp".to_string()));
    assert!(args.contains(&"--disable-demuxer=yuv4mpegpipe".to_string()));
    assert!(args.contains(&"--disable-decoder=zmbv".to_string()));
    assert!(args.contains(&"--disable-bsf=vp9_superframe_split".to_string()));
    assert_eq!(args.iter().filter(|a| a.starts_with("--disable-decoder=")).count(), 284);
  }

  #[test]
  fn id3tag_edit_fixes_optimize_once() {
    let manifest = all().unwrap();
    let Some(PatchSpec::Edits(edits)) = &manifest.get("libid3tag").unwrap().patches else {
      panic!("libid3tag should carry an edit");
    };

    let input = "optimize=\"$1\"\noptimize=\"$1\"\n";
    let output = (edits[0].transform)(input);

    assert_eq!(output, "optimize=\"$optimize $1\"\noptimize=\"$1\"\n");
  }
}
