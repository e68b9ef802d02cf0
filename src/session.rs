use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Msg};
use russh::keys::{Algorithm, HashAlg, PrivateKey, PrivateKeyWithHashAlg, PublicKey};
use russh::{Channel, Disconnect, Preferred};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::trust::HostTrustPolicy;

/// Bound on establishing the connection (TCP dial, handshake, auth). The
/// operations that follow run unbounded.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("timed out connecting to {addr}")]
    Timeout { addr: String },
    #[error("failed to dial {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ssh handshake with {addr} failed: {source}")]
    Handshake {
        addr: String,
        #[source]
        source: russh::Error,
    },
    #[error("authentication error: {0}")]
    Auth(#[source] russh::Error),
    #[error("server rejected public-key authentication for {username}")]
    AuthRejected { username: String },
    #[error("failed to close connection: {0}")]
    Close(#[source] russh::Error),
}

/// Transport parameters for one dial.
pub struct SessionOptions {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub connect_timeout: Duration,
    /// Restrict the host-key signature algorithms offered during key
    /// exchange. `None` keeps the transport's default list.
    pub host_key_algorithms: Option<Vec<Algorithm>>,
}

impl SessionOptions {
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            connect_timeout: CONNECT_TIMEOUT,
            host_key_algorithms: None,
        }
    }
}

/// Enforces a [`HostTrustPolicy`] during the handshake.
pub(crate) struct HostVerifier {
    host: String,
    port: u16,
    policy: HostTrustPolicy,
}

impl client::Handler for HostVerifier {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.policy {
            HostTrustPolicy::Pinned(expected) => {
                let accepted = expected == server_public_key;
                if !accepted {
                    warn!(
                        host = %self.host,
                        port = self.port,
                        "server host key does not match the pinned key"
                    );
                }
                Ok(accepted)
            }
            HostTrustPolicy::AcceptAny => {
                warn!(
                    host = %self.host,
                    port = self.port,
                    "accepting server host key without verification"
                );
                Ok(true)
            }
        }
    }
}

/// An authenticated, encrypted connection to the remote host.
///
/// Operation handles are opened on top of it and must be closed before
/// [`RemoteSession::disconnect`] runs; the operation implementations close
/// their own handles inside `run`, which keeps the ordering structural.
pub struct RemoteSession {
    handle: client::Handle<HostVerifier>,
    addr: String,
}

impl RemoteSession {
    /// Dial, verify the host against `trust`, and authenticate with the
    /// decrypted private key as the sole method.
    ///
    /// Failures keep their lower-layer cause: DNS and TCP trouble surface in
    /// `Dial`, a host-key rejection or negotiation failure in `Handshake`,
    /// and a server "no" in `AuthRejected`.
    pub async fn connect(
        options: SessionOptions,
        identity: PrivateKey,
        trust: HostTrustPolicy,
    ) -> Result<Self, SessionError> {
        let addr = format!("{}:{}", options.host, options.port);

        let mut config = client::Config::default();
        if let Some(algorithms) = options.host_key_algorithms {
            config.preferred = Preferred {
                key: Cow::Owned(algorithms),
                ..Preferred::default()
            };
        }

        info!(%addr, username = %options.username, "connecting");

        let stream = timeout(options.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| SessionError::Timeout { addr: addr.clone() })?
            .map_err(|source| SessionError::Dial {
                addr: addr.clone(),
                source,
            })?;

        let handler = HostVerifier {
            host: options.host,
            port: options.port,
            policy: trust,
        };
        let mut handle = timeout(
            options.connect_timeout,
            client::connect_stream(Arc::new(config), stream, handler),
        )
        .await
        .map_err(|_| SessionError::Timeout { addr: addr.clone() })?
        .map_err(|source| SessionError::Handshake {
            addr: addr.clone(),
            source,
        })?;

        // RSA keys sign with SHA-512; everything else has a fixed hash.
        let hash_alg = if identity.algorithm().is_rsa() {
            Some(HashAlg::Sha512)
        } else {
            None
        };
        let auth = handle
            .authenticate_publickey(
                &options.username,
                PrivateKeyWithHashAlg::new(Arc::new(identity), hash_alg),
            )
            .await
            .map_err(SessionError::Auth)?;
        if !auth.success() {
            return Err(SessionError::AuthRejected {
                username: options.username,
            });
        }

        info!(%addr, "authenticated");
        Ok(Self { handle, addr })
    }

    pub(crate) async fn open_channel(&self) -> Result<Channel<Msg>, russh::Error> {
        self.handle.channel_open_session().await
    }

    /// Close the transport. Consumes the session so it closes exactly once.
    pub async fn disconnect(self) -> Result<(), SessionError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "")
            .await
            .map_err(SessionError::Close)?;
        debug!(addr = %self.addr, "connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use russh::client::Handler;
    use russh::keys;

    use super::*;

    const KEY_A: &str = "AAAAC3NzaC1lZDI1NTE5AAAAIDzEH+V9JHfrFqkXCzx2Zokz/IJHkcxI4uiRWg3erYmg";
    const KEY_B: &str = "AAAAC3NzaC1lZDI1NTE5AAAAIDuc1zTCB1eXWRhIG63goeApysKI8CTKh9Ms7Bi4yuF0";

    fn verifier_for(policy: HostTrustPolicy) -> HostVerifier {
        HostVerifier {
            host: "build.example.com".into(),
            port: 22,
            policy,
        }
    }

    #[test]
    fn defaults_are_port_22_and_ten_seconds() {
        let options = SessionOptions::new("build.example.com", "deploy");
        assert_eq!(options.port, 22);
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
        assert!(options.host_key_algorithms.is_none());
    }

    #[tokio::test]
    async fn pinned_policy_accepts_the_pinned_key() {
        let pinned = keys::parse_public_key_base64(KEY_A).expect("parse key");
        let mut verifier = verifier_for(HostTrustPolicy::Pinned(pinned.clone()));
        assert!(verifier.check_server_key(&pinned).await.expect("check"));
    }

    #[tokio::test]
    async fn pinned_policy_rejects_any_other_key() {
        let pinned = keys::parse_public_key_base64(KEY_A).expect("parse key");
        let presented = keys::parse_public_key_base64(KEY_B).expect("parse key");
        let mut verifier = verifier_for(HostTrustPolicy::Pinned(pinned));
        assert!(!verifier.check_server_key(&presented).await.expect("check"));
    }

    #[tokio::test]
    async fn accept_any_policy_accepts_everything() {
        let presented = keys::parse_public_key_base64(KEY_B).expect("parse key");
        let mut verifier = verifier_for(HostTrustPolicy::AcceptAny);
        assert!(verifier.check_server_key(&presented).await.expect("check"));
    }
}
