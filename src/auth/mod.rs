//! Temporary credential acquisition and caching
//!
//! A single cache file holds the raw assume-role response. It is reused while
//! its expiry is in the future and replaced wholesale otherwise.

#[cfg(feature = "aws")]
pub mod aws;

use crate::error::{DiagError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Key added next to the raw response so a cache written for one role is
/// never reused for another.
const ROLE_KEY: &str = "RoleArn";

/// A temporary, expiring set of cloud-access secrets
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl CredentialSet {
    /// Usable iff the expiry is strictly after `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration > now
    }

    /// Extract the credential set from an assume-role response document
    pub fn from_document(doc: &Value) -> Option<Self> {
        let creds = doc.get("Credentials")?;
        let field = |name: &str| creds.get(name).and_then(Value::as_str).map(String::from);

        let expiration = DateTime::parse_from_rfc3339(&field("Expiration")?)
            .ok()?
            .with_timezone(&Utc);

        Some(Self {
            access_key_id: field("AccessKeyId")?,
            secret_access_key: field("SecretAccessKey")?,
            session_token: field("SessionToken")?,
            expiration,
        })
    }

    /// Environment entries understood by AWS SDKs and CLIs
    pub fn env_vars(&self) -> [(&'static str, &str); 3] {
        [
            ("AWS_ACCESS_KEY_ID", self.access_key_id.as_str()),
            ("AWS_SECRET_ACCESS_KEY", self.secret_access_key.as_str()),
            ("AWS_SESSION_TOKEN", self.session_token.as_str()),
        ]
    }
}

/// Parameters of one assume-role exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub duration_secs: i32,
}

/// Exchanges long-lived credentials for a temporary session.
///
/// Implementations return the raw response document, shaped like the STS
/// `AssumeRole` response (`Credentials.{AccessKeyId, SecretAccessKey,
/// SessionToken, Expiration}`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn assume_role(&self, request: &AssumeRoleRequest) -> Result<Value>;
}

/// Single-slot credential cache backed by a JSON file
pub struct CredentialCache {
    path: PathBuf,
    exchange: Box<dyn CredentialExchange>,
    session_name: String,
    duration_secs: i32,
    timeout: Duration,
}

impl CredentialCache {
    pub fn new(path: impl Into<PathBuf>, exchange: Box<dyn CredentialExchange>) -> Self {
        Self {
            path: path.into(),
            exchange,
            session_name: "dexdiag".to_string(),
            duration_secs: 3600,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_session(mut self, name: impl Into<String>, duration_secs: i32) -> Self {
        self.session_name = name.into();
        self.duration_secs = duration_secs;
        self
    }

    /// Upper bound on a single assume-role exchange
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return a usable credential set for `role`, re-authenticating if needed.
    ///
    /// No role means ambient credentials are used as-is and the cache is not
    /// touched. Any unreadable, malformed or expired cache triggers exactly
    /// one exchange; a failed exchange is fatal.
    pub async fn ensure_valid_session(&self, role: Option<&str>) -> Result<Option<CredentialSet>> {
        let Some(role) = role else {
            tracing::debug!("No role configured, using ambient credentials");
            return Ok(None);
        };

        let _lock = CacheLock::acquire(&self.path)?;

        if let Some(creds) = self.read_cached(role) {
            tracing::info!(expires = %creds.expiration, "Reusing cached session");
            return Ok(Some(creds));
        }

        tracing::info!(role, "Assuming role");
        let request = AssumeRoleRequest {
            role_arn: role.to_string(),
            session_name: self.session_name.clone(),
            duration_secs: self.duration_secs,
        };
        let mut doc = tokio::time::timeout(self.timeout, self.exchange.assume_role(&request))
            .await
            .map_err(|_| {
                DiagError::Auth(format!(
                    "{}: assume-role timed out after {}s",
                    role,
                    self.timeout.as_secs()
                ))
            })??;

        let creds = CredentialSet::from_document(&doc).ok_or_else(|| {
            DiagError::Auth("assume-role response is missing credentials".to_string())
        })?;

        if let Value::Object(map) = &mut doc {
            map.insert(ROLE_KEY.to_string(), Value::String(role.to_string()));
        }
        self.persist(&doc)?;

        Ok(Some(creds))
    }

    /// Cached credentials, if present, well-formed, for `role` and unexpired
    fn read_cached(&self, role: &str) -> Option<CredentialSet> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let doc: Value = match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable credential cache");
                return None;
            }
        };

        if let Some(cached_role) = doc.get(ROLE_KEY).and_then(Value::as_str) {
            if cached_role != role {
                tracing::debug!(cached_role, "Cached session belongs to another role");
                return None;
            }
        }

        CredentialSet::from_document(&doc).filter(|c| c.is_valid_at(Utc::now()))
    }

    /// Replace the cache content via write-then-rename.
    ///
    /// The temp file is created owner-only (0600) with a random name, so the
    /// persisted secrets are never readable by other local users.
    fn persist(&self, doc: &Value) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        tmp.write_all(serde_json::to_string_pretty(doc)?.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Advisory exclusive lock on `<cache>.lock`, released on drop
struct CacheLock {
    file: File,
}

impl CacheLock {
    fn acquire(cache_path: &Path) -> Result<Self> {
        if let Some(parent) = cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut lock_path = cache_path.as_os_str().to_owned();
        lock_path.push(".lock");

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(PathBuf::from(lock_path))?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
