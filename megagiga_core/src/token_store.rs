use crate::TokenPair;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::{fs, io};

/// Easy alias for error handling
pub type Result<T> = std::result::Result<T, Error>;

/// Problems reading or writing the stored session
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// We had a problem reading or writing the file, for example with
    /// permissions.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file was there but didn't contain a session.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A session as written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// The tokens themselves
    pub tokens: TokenPair,

    /// When we got them
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    /// Stamp a token pair with the current time.
    pub fn now(tokens: TokenPair) -> Self {
        Self {
            tokens,
            saved_at: Utc::now(),
        }
    }
}

/// Keeps the session in a JSON file between runs.
#[derive(Debug, Clone)]
pub struct TokenStore {
    /// Where the session file lives
    path: PathBuf,
}

impl TokenStore {
    /// Store the session at `path`. Nothing is read or written until asked.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the session in the usual file inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("session.json"))
    }

    /// Where the session file lives
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session, if there is one.
    ///
    /// ## Errors
    ///
    /// A missing file is `Ok(None)`. Anything else that goes wrong reading or
    /// parsing the file is an error.
    pub async fn load(&self) -> Result<Option<StoredSession>> {
        if !fs::try_exists(&self.path).await? {
            tracing::debug!(path = ?self.path, "no stored session");
            return Ok(None);
        }

        let data = fs::read(&self.path).await?;
        let session = serde_json::from_slice(&data)?;

        Ok(Some(session))
    }

    /// Write the session, creating the parent directory if needed. On unix
    /// the file is readable and writable by the owner only.
    ///
    /// ## Errors
    ///
    /// Errors if the directory or file can't be written.
    pub async fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec(session)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;

        // `mode` only applies to new files
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        file.write_all(&data).await?;
        file.flush().await?;

        tracing::debug!(path = ?self.path, "saved session");
        Ok(())
    }

    /// Forget the stored session.
    ///
    /// ## Errors
    ///
    /// Errors if the file exists but can't be removed.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
