//! Authenticated-session flag
//!
//! The flag lives in memory and is mirrored to a small file, so a restarted
//! daemon comes back in the same state. There is no expiry.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, warn};

const FLAG_VALUE: &str = "true";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to persist session flag at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub struct Session {
    flag_path: PathBuf,
    authenticated: AtomicBool,
}

impl Session {
    /// Load the flag from `flag_path`; anything but `true` means signed out
    pub fn load(flag_path: impl Into<PathBuf>) -> Self {
        let flag_path = flag_path.into();
        let authenticated = match std::fs::read_to_string(&flag_path) {
            Ok(contents) => contents.trim() == FLAG_VALUE,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(error = %e, path = %flag_path.display(), "unreadable session flag, starting signed out");
                false
            }
        };
        info!(authenticated, "session loaded");
        Self {
            flag_path,
            authenticated: AtomicBool::new(authenticated),
        }
    }

    pub fn flag_path(&self) -> &Path {
        &self.flag_path
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Relaxed)
    }

    pub fn login(&self) -> SessionResult<()> {
        std::fs::write(&self.flag_path, FLAG_VALUE).map_err(|source| SessionError::Persist {
            path: self.flag_path.clone(),
            source,
        })?;
        self.authenticated.store(true, Ordering::Relaxed);
        info!("session authenticated");
        Ok(())
    }

    /// Sign out; a missing flag file is already signed out
    pub fn invalidate(&self) -> SessionResult<()> {
        self.authenticated.store(false, Ordering::Relaxed);
        match std::fs::remove_file(&self.flag_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SessionError::Persist {
                    path: self.flag_path.clone(),
                    source,
                })
            }
        }
        info!("session invalidated");
        Ok(())
    }
}
