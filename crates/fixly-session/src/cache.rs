use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::SessionError;

/// On-disk bearer token cache so a login survives process restarts.
/// One file holding the raw token; removing the file is the logout.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Reads the cached token. A missing or blank file means no session
    /// is cached.
    ///
    /// # Errors
    ///
    /// [`SessionError::Cache`] for any read failure other than the file
    /// not existing.
    pub fn load(&self) -> Result<Option<String>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error("read", e)),
        }
    }

    /// Writes the token, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// [`SessionError::Cache`] when the directory or file cannot be
    /// written.
    pub fn store(&self, token: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error("create", e))?;
        }
        fs::write(&self.path, token).map_err(|e| self.io_error("write", e))
    }

    /// Deletes the cache; a file that is already gone is fine.
    ///
    /// # Errors
    ///
    /// [`SessionError::Cache`] for any other removal failure.
    pub fn remove(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("remove", e)),
        }
    }

    fn io_error(&self, action: &'static str, source: std::io::Error) -> SessionError {
        SessionError::Cache {
            action,
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_cache_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("token"));
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn store_creates_parents_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("fixly/session/token"));
        cache.store("jwt-abc").unwrap();
        assert_eq!(cache.load().unwrap().as_deref(), Some("jwt-abc"));
    }

    #[test]
    fn blank_file_counts_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();
        let cache = TokenCache::new(path);
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn remove_tolerates_a_missing_file() {
        let dir = TempDir::new().unwrap();
        let cache = TokenCache::new(dir.path().join("token"));
        cache.remove().unwrap();

        cache.store("jwt-abc").unwrap();
        cache.remove().unwrap();
        assert!(cache.load().unwrap().is_none());
    }
}
