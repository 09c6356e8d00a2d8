//! Pid file persistence
//!
//! A pid file holds the decimal process id of one managed service, with no
//! trailing newline. Its existence is what `stop` and `clean` treat as "this
//! service is (believed to be) running".

use crate::error::{C8RunError, C8RunResult};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::warn;

/// Contents of a pid file as read at stop time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistedPid {
    /// Whitespace-trimmed text parsed as a positive integer
    Valid(u32),
    /// Anything else; stop treats it as "nothing to kill"
    Malformed,
}

impl PersistedPid {
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<u32>() {
            Ok(pid) if pid > 0 => PersistedPid::Valid(pid),
            _ => PersistedPid::Malformed,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            PersistedPid::Valid(pid) => Some(*pid),
            PersistedPid::Malformed => None,
        }
    }
}

/// Write `pid`, replacing any previous content
pub fn write(path: &Path, pid: u32) -> C8RunResult<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|err| C8RunError::filesystem(path, err))?;
    file.write_all(pid.to_string().as_bytes())
        .map_err(|err| C8RunError::filesystem(path, err))
}

/// `None` when the file does not exist. Content that is not UTF-8, or a
/// file that exists but cannot be read, yields `Malformed` so a corrupt pid
/// file never blocks `stop`.
pub fn read(path: &Path) -> Option<PersistedPid> {
    match fs::read(path) {
        Ok(bytes) => Some(PersistedPid::parse(&String::from_utf8_lossy(&bytes))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            warn!("cannot read pid file {}: {}", path.display(), err);
            Some(PersistedPid::Malformed)
        }
    }
}

/// Remove the file; an already missing file is fine
pub fn remove(path: &Path) -> C8RunResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(C8RunError::filesystem(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_yields_same_pid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("camunda.pid");
        write(&path, 4821).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "4821");
        assert_eq!(read(&path), Some(PersistedPid::Valid(4821)));
    }

    #[test]
    fn test_write_truncates_longer_previous_pid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("connectors.pid");
        write(&path, 123456).unwrap();
        write(&path, 42).unwrap();
        assert_eq!(read(&path), Some(PersistedPid::Valid(42)));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(PersistedPid::parse("  4821\n"), PersistedPid::Valid(4821));
        assert_eq!(PersistedPid::parse("\t77\r\n"), PersistedPid::Valid(77));
    }

    #[test]
    fn test_parse_rejects_garbage_and_zero() {
        assert_eq!(PersistedPid::parse(""), PersistedPid::Malformed);
        assert_eq!(PersistedPid::parse("abc"), PersistedPid::Malformed);
        assert_eq!(PersistedPid::parse("-5"), PersistedPid::Malformed);
        assert_eq!(PersistedPid::parse("0"), PersistedPid::Malformed);
        assert_eq!(PersistedPid::Malformed.pid(), None);
    }

    #[test]
    fn test_non_utf8_content_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("camunda.pid");
        fs::write(&path, [0xff, 0xfe, 0x31]).unwrap();
        assert_eq!(read(&path), Some(PersistedPid::Malformed));
    }

    #[test]
    fn test_missing_file_reads_as_none_and_removes_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("elasticsearch.pid");
        assert_eq!(read(&path), None);
        remove(&path).unwrap();
    }
}
