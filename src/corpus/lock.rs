//! Single-writer lock over a corpus.
//!
//! The lock file records the owning process id. A lock whose owner is no
//! longer running was left by a killed run and is taken over.

use crate::error::{PodquoteError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Exclusive lock file, removed when dropped.
#[derive(Debug)]
pub struct CorpusLock {
    path: PathBuf,
}

impl CorpusLock {
    /// Create the lock file, failing if a live run holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        if Self::try_create(path, parent)? {
            return Ok(Self::held(path));
        }

        let holder = std::fs::read_to_string(path).unwrap_or_default();
        match parse_pid(&holder) {
            Some(pid) if process_alive(pid) => {
                return Err(PodquoteError::Locked(format!("{}, pid {}", path.display(), pid)));
            }
            _ => warn!("Taking over stale lock {:?} ({})", path, holder.trim()),
        }

        // Only remove the lock we judged stale, not one a concurrent run just took
        if std::fs::read_to_string(path).unwrap_or_default() == holder {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(PodquoteError::persistence(path, e)),
            }
        }

        if Self::try_create(path, parent)? {
            Ok(Self::held(path))
        } else {
            Err(PodquoteError::Locked(path.display().to_string()))
        }
    }

    /// Atomically create the lock with its contents. Returns false if it exists.
    fn try_create(path: &Path, parent: &Path) -> Result<bool> {
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| PodquoteError::persistence(path, e))?;
        writeln!(
            tmp,
            "pid={} started={}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        )
        .map_err(|e| PodquoteError::persistence(path, e))?;

        match tmp.persist_noclobber(path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(PodquoteError::persistence(path, e.error)),
        }
    }

    fn held(path: &Path) -> Self {
        debug!("Acquired corpus lock {:?}", path);
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Drop for CorpusLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove lock file {:?}: {}", self.path, e);
        }
    }
}

fn parse_pid(contents: &str) -> Option<u32> {
    contents
        .split_whitespace()
        .find_map(|field| field.strip_prefix("pid="))
        .and_then(|pid| pid.parse().ok())
}

fn process_alive(pid: u32) -> bool {
    let system = sysinfo::System::new_all();
    system.process(sysinfo::Pid::from_u32(pid)).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pid of a process that has already exited.
    fn dead_pid() -> u32 {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        pid
    }

    /// Leave a lock behind the way a killed run does.
    fn leave_stale_lock(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            path,
            format!("pid={} started=2026-01-01T00:00:00+00:00\n", dead_pid()),
        )
        .unwrap();
    }

    #[test]
    fn test_lock_is_exclusive_and_released() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".podquote.lock");

        let lock = CorpusLock::acquire(&path).unwrap();
        assert!(matches!(
            CorpusLock::acquire(&path),
            Err(PodquoteError::Locked(_))
        ));

        drop(lock);
        assert!(!path.exists());
        assert!(CorpusLock::acquire(&path).is_ok());
    }

    #[test]
    fn test_lock_records_owner() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".podquote.lock");

        let _lock = CorpusLock::acquire(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_pid(&contents), Some(std::process::id()));
    }

    #[test]
    fn test_lock_of_exited_process_is_taken_over() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("output").join(".podquote.lock");
        leave_stale_lock(&path);

        let lock = CorpusLock::acquire(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_pid(&contents), Some(std::process::id()));

        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_unreadable_lock_is_stale() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".podquote.lock");
        std::fs::write(&path, "").unwrap();

        assert!(CorpusLock::acquire(&path).is_ok());
    }

    #[test]
    fn test_parse_pid() {
        assert_eq!(parse_pid("pid=42 started=2026-01-01T00:00:00Z"), Some(42));
        assert_eq!(parse_pid("started=now"), None);
    }
}
