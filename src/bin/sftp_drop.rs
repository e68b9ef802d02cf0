//! SFTP demonstration: connect once and drop a greeting file on the remote
//! host, under `/home/<user>/hello/world`.

use anyhow::{Context, Result};
use russh::keys::{Algorithm, HashAlg};
use tracing::info;

use faraway::config::RunConfig;
use faraway::operation::{RemoteOperation, SftpDrop};
use faraway::session::{RemoteSession, SessionOptions};
use faraway::trust::HostTrustPolicy;
use faraway::{identity, logging, trust};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();
    info!("sftp drop starting");

    let config = RunConfig::from_env().context("incomplete configuration")?;

    let host_key = trust::parse_known_hosts_entry(&config.known_host_entry)
        .context("invalid KNOWN_HOST_SHA entry")?;
    let identity = identity::load_identity(&config.private_key_path, &config.passphrase)
        .await
        .context("unable to load the private key")?;

    let mut options = SessionOptions::new(&config.host, &config.username);
    options.port = config.port;
    options.host_key_algorithms = Some(vec![Algorithm::Rsa {
        hash: Some(HashAlg::Sha512),
    }]);

    let session = RemoteSession::connect(options, identity, HostTrustPolicy::Pinned(host_key))
        .await
        .context("connection failed")?;

    let outcome = SftpDrop::new(&config.username).run(&session).await;
    let closed = session.disconnect().await;

    outcome.context("sftp write failed")?;
    closed.context("teardown failed")?;
    Ok(())
}
