//! Flavor and worker discovery
//!
//! Workers are the sub-directories of the worker root; flavors are the
//! `*.json` descriptors directly inside a worker directory.

use crate::error::{CoreError, Result};
use crate::model::{Flavor, Worker};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of flavor descriptor files.
const FLAVOR_EXTENSION: &str = "json";

/// Enumerates the flavors of one worker directory.
///
/// Each call to [`FlavorSource::flavors`] re-reads the directory, so the
/// sequence can be walked again. Descriptors are parsed lazily.
#[derive(Debug, Clone)]
pub struct FlavorSource {
    dir: PathBuf,
}

impl FlavorSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Descriptor files in name order. A missing directory yields none.
    pub fn descriptor_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            debug!(dir = %self.dir.display(), "Worker directory not found");
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|source| CoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(FLAVOR_EXTENSION)
            {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Lazily parsed flavors; each item is the descriptor path and its
    /// parse result.
    pub fn flavors(&self) -> Result<Flavors> {
        Ok(Flavors {
            paths: self.descriptor_paths()?.into_iter(),
        })
    }
}

/// Iterator returned by [`FlavorSource::flavors`].
#[derive(Debug)]
pub struct Flavors {
    paths: std::vec::IntoIter<PathBuf>,
}

impl Iterator for Flavors {
    type Item = (PathBuf, Result<Flavor>);

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        let flavor = load_flavor(&path);
        Some((path, flavor))
    }
}

/// Parse a single flavor descriptor.
pub fn load_flavor(path: &Path) -> Result<Flavor> {
    let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CoreError::InvalidFlavor {
        path: path.to_path_buf(),
        source,
    })
}

/// List every worker under `worker_root`, relative to `base_path`.
///
/// `worker_root` is repository-relative (e.g. `analyzers`). Hidden
/// directories are ignored. Result is sorted by name.
#[tracing::instrument(skip(base_path), fields(base_path = %base_path.display()))]
pub fn list_workers(base_path: &Path, worker_root: &Path) -> Result<Vec<Worker>> {
    let dir = base_path.join(worker_root);
    let entries = std::fs::read_dir(&dir).map_err(|source| CoreError::Io {
        path: dir.clone(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CoreError::Io {
            path: dir.clone(),
            source,
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if name.starts_with('.') => {}
            Ok(name) => names.push(name),
            Err(name) => warn!(?name, "Skipping worker with non UTF-8 name"),
        }
    }
    names.sort();

    names
        .iter()
        .map(|name| Worker::from_path(worker_root.join(name)))
        .collect()
}

/// Resolve explicitly named workers under `worker_root`.
pub fn named_workers<S: AsRef<str>>(worker_root: &Path, names: &[S]) -> Result<Vec<Worker>> {
    names
        .iter()
        .map(|name| Worker::from_path(worker_root.join(name.as_ref())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const DNS: &str = r#"{"name":"DNS_Lookup","version":"1.0","description":"dns","command":"dns.py"}"#;
    const DNS_V2: &str = r#"{"name":"DNS_Lookup_2","version":"2.0","description":"dns","command":"dns2.py"}"#;

    #[test]
    fn test_missing_directory_is_empty() {
        let temp_dir = tempdir().unwrap();
        let source = FlavorSource::new(temp_dir.path().join("nope"));
        assert_eq!(source.flavors().unwrap().count(), 0);
    }

    #[test]
    fn test_only_json_files_directly_inside() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("dns.json"), DNS).unwrap();
        fs::write(temp_dir.path().join("README.md"), "# dns").unwrap();
        fs::write(temp_dir.path().join("requirements.txt"), "dnspython").unwrap();
        let nested = temp_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("other.json"), DNS_V2).unwrap();

        let source = FlavorSource::new(temp_dir.path());
        let flavors: Vec<Flavor> = source
            .flavors()
            .unwrap()
            .map(|(_, flavor)| flavor.unwrap())
            .collect();
        assert_eq!(flavors.len(), 1);
        assert_eq!(flavors[0].name, "DNS_Lookup");
    }

    #[test]
    fn test_flavors_are_restartable_and_ordered() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("b.json"), DNS_V2).unwrap();
        fs::write(temp_dir.path().join("a.json"), DNS).unwrap();

        let source = FlavorSource::new(temp_dir.path());
        let first: Vec<String> = source
            .flavors()
            .unwrap()
            .map(|(_, f)| f.unwrap().name)
            .collect();
        let second: Vec<String> = source
            .flavors()
            .unwrap()
            .map(|(_, f)| f.unwrap().name)
            .collect();
        assert_eq!(first, vec!["DNS_Lookup", "DNS_Lookup_2"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_descriptor_is_an_error() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(
            temp_dir.path().join("partial.json"),
            r#"{"name":"X","version":"1"}"#,
        )
        .unwrap();
        fs::write(temp_dir.path().join("ok.json"), DNS).unwrap();

        let results: Vec<(PathBuf, Result<Flavor>)> =
            FlavorSource::new(temp_dir.path()).flavors().unwrap().collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results[0].1,
            Err(CoreError::InvalidFlavor { .. })
        ));
        assert!(results[1].1.is_ok());
        assert!(matches!(
            results[2].1,
            Err(CoreError::InvalidFlavor { .. })
        ));
    }

    #[test]
    fn test_list_workers_sorted_directories_only() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().join("analyzers");
        fs::create_dir_all(root.join("whois")).unwrap();
        fs::create_dir_all(root.join("dns-lookup")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("README.md"), "workers").unwrap();

        let workers = list_workers(temp_dir.path(), Path::new("analyzers")).unwrap();
        let names: Vec<&str> = workers.iter().map(|w| w.name()).collect();
        assert_eq!(names, vec!["dns-lookup", "whois"]);
        assert_eq!(workers[0].path(), Path::new("analyzers/dns-lookup"));
    }

    #[test]
    fn test_list_workers_missing_root_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let result = list_workers(temp_dir.path(), Path::new("analyzers"));
        assert!(matches!(result, Err(CoreError::Io { .. })));
    }

    #[test]
    fn test_named_workers() {
        let workers = named_workers(Path::new("analyzers"), &["whois"]).unwrap();
        assert_eq!(workers[0].path(), Path::new("analyzers/whois"));
    }
}
