//! Worker definition

use crate::error::{CoreError, Result};
use std::path::{Component, Path, PathBuf};

/// A directory holding one independently buildable component.
///
/// `path` is relative to the repository root (e.g. `analyzers/dns-lookup`)
/// and is the prefix used for change detection. The worker name is the
/// last path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Worker {
    name: String,
    path: PathBuf,
}

impl Worker {
    /// Build a worker from a repository-relative path.
    ///
    /// `.` segments are dropped so that `./analyzers/foo` and
    /// `analyzers/foo` compare equal against diff output.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = path.as_ref();
        let mut normalized = PathBuf::new();
        for component in raw.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => normalized.push(part),
                _ => return Err(CoreError::InvalidWorkerPath(raw.to_path_buf())),
            }
        }

        let name = normalized
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| CoreError::InvalidWorkerPath(raw.to_path_buf()))?;

        Ok(Self {
            name,
            path: normalized,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Repository-relative path of the worker directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a repository-relative path lies inside this worker.
    ///
    /// Matching is per path segment: `analyzers/foo` does not own
    /// `analyzers/foobar/x`.
    pub fn owns(&self, changed: &Path) -> bool {
        changed.starts_with(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_last_segment() {
        let worker = Worker::from_path("analyzers/dns-lookup").unwrap();
        assert_eq!(worker.name(), "dns-lookup");
        assert_eq!(worker.path(), Path::new("analyzers/dns-lookup"));
    }

    #[test]
    fn test_curdir_segments_are_dropped() {
        let worker = Worker::from_path("./analyzers/./whois/").unwrap();
        assert_eq!(worker.path(), Path::new("analyzers/whois"));
        assert_eq!(worker.name(), "whois");
    }

    #[test]
    fn test_owns_matches_on_segment_boundary() {
        let worker = Worker::from_path("analyzers/foo").unwrap();
        assert!(worker.owns(Path::new("analyzers/foo/main.py")));
        assert!(worker.owns(Path::new("analyzers/foo")));
        assert!(!worker.owns(Path::new("analyzers/foobar/main.py")));
        assert!(!worker.owns(Path::new("analyzers/fo")));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        assert!(Worker::from_path("../outside").is_err());
        assert!(Worker::from_path("/abs/worker").is_err());
        assert!(Worker::from_path(".").is_err());
    }
}
