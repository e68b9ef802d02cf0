use std::env;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use zeroize::Zeroizing;

pub const ENV_REMOTE_USER: &str = "REMOTE_USER";
pub const ENV_PASSWORD: &str = "PASSWORD";
pub const ENV_REMOTE_HOST: &str = "REMOTE_HOST";
pub const ENV_PRIVATE_KEY_FILE_PATH: &str = "PRIVATE_KEY_FILE_PATH";
pub const ENV_KNOWN_HOST_SHA: &str = "KNOWN_HOST_SHA";

pub const DEFAULT_SSH_PORT: u16 = 22;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Everything a run needs to reach and authenticate to the remote host.
///
/// Built once at startup and passed down; nothing else in the pipeline
/// touches the process environment.
pub struct RunConfig {
    pub username: String,
    /// Passphrase for the private key. Wiped on drop.
    pub passphrase: Zeroizing<String>,
    pub host: String,
    pub port: u16,
    pub private_key_path: PathBuf,
    /// A single known-hosts-format line carrying the expected host key.
    pub known_host_entry: String,
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|name| env::var(name).ok())
    }

    fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            username: require(ENV_REMOTE_USER)?,
            passphrase: Zeroizing::new(require(ENV_PASSWORD)?),
            host: require(ENV_REMOTE_HOST)?,
            port: DEFAULT_SSH_PORT,
            private_key_path: PathBuf::from(require(ENV_PRIVATE_KEY_FILE_PATH)?),
            known_host_entry: require(ENV_KNOWN_HOST_SHA)?,
        })
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("username", &self.username)
            .field("passphrase", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("private_key_path", &self.private_key_path)
            .field("known_host_entry", &self.known_host_entry)
            .finish()
    }
}
