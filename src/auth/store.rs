use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use super::credential::Credential;
use super::error::AuthError;

const FILE_PREFIX: &str = "robinhood_";

/// Storage abstraction for persisted credentials, keyed by login identity.
pub trait CredentialStore: Send + Sync {
    /// Load a live credential.
    ///
    /// Missing, unreadable, malformed and expired records all read as `None`;
    /// an expired record is removed as a side effect.
    fn load(&self, identity: &str) -> Option<Credential>;
    /// Persist `credential`, stamping `issued_at` when unset.
    fn save(&self, identity: &str, credential: &Credential) -> Result<(), AuthError>;
    /// Remove the stored record. Missing records are not an error.
    fn delete(&self, identity: &str) -> Result<(), AuthError>;
}

/// Configuration for file-backed credential storage.
#[derive(Debug, Clone)]
pub struct CredentialStoreConfig {
    pub base_dir: PathBuf,
}

impl CredentialStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_tokens_dir()
    }
}

/// One JSON file per identity below a private directory.
///
/// Files are written with mode `0600` and the directory with `0700`. There is
/// no cross-process lock: concurrent logins for one identity race and the last
/// write wins.
///
/// # Example
/// ```no_run
/// use robinstock::auth::{Credential, CredentialStore, FileCredentialStore};
///
/// let store = FileCredentialStore::new_default();
/// let credential = Credential {
///     access_token: "access".to_string(),
///     refresh_token: "refresh".to_string(),
///     token_type: "Bearer".to_string(),
///     device_token: "00112233-4455-6677-8899-aabbccddeeff".to_string(),
///     expires_in: 86400,
///     issued_at: None,
/// };
/// store.save("alice@example.com", &credential)?;
/// assert!(store.load("alice@example.com").is_some());
/// # Ok::<(), robinstock::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    base_dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(config: CredentialStoreConfig) -> Self {
        Self {
            base_dir: config.base_dir,
        }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_tokens_dir(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the record for `identity`.
    pub fn credential_path(&self, identity: &str) -> PathBuf {
        self.base_dir
            .join(format!("{FILE_PREFIX}{}.json", escape_identity(identity)))
    }

    fn ensure_dir(&self) -> Result<(), AuthError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        builder.create(&self.base_dir)?;
        #[cfg(unix)]
        fs::set_permissions(&self.base_dir, fs::Permissions::from_mode(0o700))?;
        Ok(())
    }

    fn remove(path: &Path) -> Result<(), AuthError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, identity: &str) -> Option<Credential> {
        let path = self.credential_path(identity);
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Unreadable stored credential");
                return None;
            }
        };
        let credential: Credential = match serde_json::from_str(&raw) {
            Ok(credential) => credential,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Malformed stored credential");
                return None;
            }
        };
        if credential.is_expired() {
            tracing::debug!(path = %path.display(), "Stored credential expired, removing");
            if let Err(err) = Self::remove(&path) {
                tracing::warn!(path = %path.display(), error = %err, "Failed to remove expired credential");
            }
            return None;
        }
        Some(credential)
    }

    fn save(&self, identity: &str, credential: &Credential) -> Result<(), AuthError> {
        self.ensure_dir()?;
        let path = self.credential_path(identity);
        let stamped = credential.stamped(Utc::now());
        let serialized = serde_json::to_vec_pretty(&stamped)?;
        write_private(&path, &serialized)?;
        tracing::debug!(path = %path.display(), "Saved credential");
        Ok(())
    }

    fn delete(&self, identity: &str) -> Result<(), AuthError> {
        Self::remove(&self.credential_path(identity))
    }
}

fn default_tokens_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".tokens"))
        .unwrap_or_else(|| PathBuf::from(".tokens"))
}

/// File-name form of an identity. Lowercase letters, digits and `-_.@` pass
/// through; every other byte becomes `%XX`, so distinct identities never
/// share a file, even on case-insensitive filesystems.
fn escape_identity(identity: &str) -> String {
    let mut out = String::with_capacity(identity.len());
    for byte in identity.bytes() {
        if byte.is_ascii_lowercase()
            || byte.is_ascii_digit()
            || matches!(byte, b'-' | b'_' | b'.' | b'@')
        {
            out.push(char::from(byte));
        } else {
            out.push('%');
            out.push_str(&hex::encode_upper([byte]));
        }
    }
    out
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `path` with `data` through an owner-only sibling temp file.
fn write_private(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_path = path.with_extension(format!("json.tmp-{}-{seq}", std::process::id()));

    let written = create_private(&temp_path, data).and_then(|()| fs::rename(&temp_path, path));
    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    written.map_err(AuthError::from)
}

fn create_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}
