//! `clean` verb: remove what previous runs left behind
//!
//! Removes `log/*.log`, the three pid files and the extracted Elasticsearch
//! and Camunda distributions. Refuses to touch anything while a pid file
//! still names a live process.

use crate::config::C8RunConfig;
use crate::core::models::Service;
use crate::core::pid_file::{self, PersistedPid};
use crate::error::{C8RunError, C8RunResult};
use crate::platform::Platform;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Paths actually deleted by [`clean`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
}

pub fn clean(config: &C8RunConfig, platform: &dyn Platform) -> C8RunResult<CleanReport> {
    ensure_nothing_running(config, platform)?;

    let mut report = CleanReport::default();

    for service in Service::ALL {
        let path = service.pid_file_path(&config.base_dir);
        if path.exists() {
            pid_file::remove(&path)?;
            report.removed.push(path);
        }
    }

    let log_dir = config.log_dir();
    match fs::read_dir(&log_dir) {
        Ok(entries) => {
            for entry in entries {
                let path = entry.map_err(|err| C8RunError::filesystem(&log_dir, err))?.path();
                if path.extension().is_some_and(|ext| ext == "log") {
                    fs::remove_file(&path).map_err(|err| C8RunError::filesystem(&path, err))?;
                    report.removed.push(path);
                }
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(C8RunError::filesystem(&log_dir, err)),
    }

    for dir in [config.elasticsearch_dir(), config.camunda_dir()] {
        if remove_dir(&dir)? {
            report.removed.push(dir);
        }
    }

    info!("clean removed {} paths", report.removed.len());
    Ok(report)
}

fn ensure_nothing_running(config: &C8RunConfig, platform: &dyn Platform) -> C8RunResult<()> {
    for service in Service::ALL {
        let path = service.pid_file_path(&config.base_dir);
        if let Some(PersistedPid::Valid(pid)) = pid_file::read(&path) {
            if platform.process_alive(pid) {
                return Err(C8RunError::StillRunning { service, pid });
            }
            debug!("{} pid {} is stale", service, pid);
        }
    }
    Ok(())
}

fn remove_dir(dir: &Path) -> C8RunResult<bool> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(C8RunError::filesystem(dir, err)),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::platform::UnixPlatform;
    use tempfile::TempDir;

    fn populated() -> (TempDir, C8RunConfig) {
        let dir = TempDir::new().unwrap();
        let config = C8RunConfig::new(dir.path());

        fs::create_dir_all(config.log_dir()).unwrap();
        fs::write(config.log_dir().join("camunda.log"), "boot").unwrap();
        fs::write(config.log_dir().join("notes.txt"), "keep").unwrap();
        fs::create_dir_all(config.elasticsearch_dir().join("bin")).unwrap();
        fs::create_dir_all(config.camunda_dir().join("lib")).unwrap();
        (dir, config)
    }

    #[test]
    fn test_clean_removes_logs_pids_and_distributions() {
        let (_dir, config) = populated();
        // Far above any pid_max, so never alive
        pid_file::write(&Service::Camunda.pid_file_path(&config.base_dir), 999_999_999).unwrap();

        let report = clean(&config, &UnixPlatform).unwrap();

        assert!(!config.log_dir().join("camunda.log").exists());
        assert!(config.log_dir().join("notes.txt").exists());
        assert!(!Service::Camunda.pid_file_path(&config.base_dir).exists());
        assert!(!config.elasticsearch_dir().exists());
        assert!(!config.camunda_dir().exists());
        assert_eq!(report.removed.len(), 4);
    }

    #[test]
    fn test_clean_refuses_while_a_service_runs() {
        let (_dir, config) = populated();
        let live = std::process::id();
        pid_file::write(&Service::Elasticsearch.pid_file_path(&config.base_dir), live).unwrap();

        let err = clean(&config, &UnixPlatform).unwrap_err();

        assert!(matches!(
            err,
            C8RunError::StillRunning { service: Service::Elasticsearch, pid } if pid == live
        ));
        assert!(config.log_dir().join("camunda.log").exists());
        assert!(config.camunda_dir().exists());
    }

    #[test]
    fn test_clean_on_empty_directory() {
        let dir = TempDir::new().unwrap();
        let config = C8RunConfig::new(dir.path());
        assert_eq!(clean(&config, &UnixPlatform).unwrap(), CleanReport::default());
    }
}
