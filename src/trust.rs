use russh::keys::{self, PublicKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("malformed known-hosts entry: {0}")]
    Malformed(&'static str),
    #[error("known-hosts entry carries an unparsable public key: {0}")]
    UnparsableKey(#[from] keys::Error),
}

/// How the remote host's key is judged during the handshake.
///
/// Both shipped binaries pin the key from the known-hosts entry. `AcceptAny`
/// stays available as an explicit, loudly-logged policy for throwaway targets
/// and is never a silent default.
#[derive(Debug, Clone)]
pub enum HostTrustPolicy {
    /// Accept exactly the key parsed from the configured known-hosts entry.
    Pinned(PublicKey),
    /// Accept whatever key the server presents.
    AcceptAny,
}

/// Parse a single known-hosts-format line into the expected host key.
///
/// The accepted shape is `[@marker] hosts key-type base64 [comment]`. The
/// host list is not matched against anything here; the caller already chose
/// which entry to trust for its one target host.
pub fn parse_known_hosts_entry(entry: &str) -> Result<PublicKey, TrustError> {
    let mut fields = entry.split_whitespace();

    let first = fields.next().ok_or(TrustError::Malformed("empty entry"))?;
    if first.starts_with('@') {
        // @cert-authority / @revoked prefix; the host list follows.
        fields
            .next()
            .ok_or(TrustError::Malformed("marker without host list"))?;
    }

    let key_type = fields.next().ok_or(TrustError::Malformed("missing key type"))?;
    let key_base64 = fields.next().ok_or(TrustError::Malformed("missing key data"))?;

    let key = keys::parse_public_key_base64(key_base64)?;
    if key.algorithm().as_str() != key_type {
        return Err(TrustError::Malformed("key type does not match key data"));
    }

    Ok(key)
}
