//! The ordered project list.
//!
//! Manifest order is build order. A project may only rely on projects that
//! come before it, since they are the only ones guaranteed to be installed
//! by the time it configures.

use std::collections::HashSet;

use thiserror::Error;

use crate::project::Project;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
  #[error("project '{0}' is declared more than once")]
  DuplicateName(String),

  #[error("projects '{first}' and '{second}' install the same artifact {artifact}")]
  DuplicateArtifact {
    first: String,
    second: String,
    artifact: String,
  },

  #[error("project '{project}' requires '{requires}', which is not declared before it")]
  RequiresLater { project: String, requires: String },

  #[error("unknown project '{0}'")]
  UnknownProject(String),
}

#[derive(Debug, Clone, Default)]
pub struct Manifest {
  projects: Vec<Project>,
}

impl Manifest {
  pub fn new(projects: Vec<Project>) -> Result<Self, ManifestError> {
    let mut names = HashSet::new();
    for (index, project) in projects.iter().enumerate() {
      if !names.insert(project.name.as_str()) {
        return Err(ManifestError::DuplicateName(project.name.clone()));
      }

      if let Some(earlier) = projects[..index].iter().find(|p| p.artifact == project.artifact) {
        return Err(ManifestError::DuplicateArtifact {
          first: earlier.name.clone(),
          second: project.name.clone(),
          artifact: project.artifact.display().to_string(),
        });
      }

      for required in &project.requires {
        if !projects[..index].iter().any(|p| &p.name == required) {
          return Err(ManifestError::RequiresLater {
            project: project.name.clone(),
            requires: required.clone(),
          });
        }
      }
    }
    Ok(Self { projects })
  }

  pub fn projects(&self) -> &[Project] {
    &self.projects
  }

  pub fn get(&self, name: &str) -> Option<&Project> {
    self.projects.iter().find(|p| p.name == name)
  }

  pub fn len(&self) -> usize {
    self.projects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.projects.is_empty()
  }

  /// The named projects, in manifest order.
  ///
  /// Prerequisites are not pulled in: selecting a project alone builds it
  /// alone, against whatever the install prefix already holds.
  pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Manifest, ManifestError> {
    for name in names {
      if self.get(name.as_ref()).is_none() {
        return Err(ManifestError::UnknownProject(name.as_ref().to_string()));
      }
    }

    let projects = self
      .projects
      .iter()
      .filter(|p| names.iter().any(|n| n.as_ref() == p.name))
      .cloned()
      .collect();
    Ok(Manifest { projects })
  }
}

impl<'a> IntoIterator for &'a Manifest {
  type Item = &'a Project;
  type IntoIter = std::slice::Iter<'a, Project>;

  fn into_iter(self) -> Self::IntoIter {
    self.projects.iter()
  }
}
