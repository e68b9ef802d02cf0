//! Interactive demonstration: connect once, run `hostname` remotely, and
//! stream its output to the local process streams.

use anyhow::{Context, Result};
use tracing::info;

use faraway::config::RunConfig;
use faraway::operation::{RemoteOperation, RunCommand};
use faraway::session::{RemoteSession, SessionOptions};
use faraway::trust::HostTrustPolicy;
use faraway::{identity, logging, trust};

const REMOTE_COMMAND: &str = "hostname";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();
    info!("remote command run starting");

    let config = RunConfig::from_env().context("incomplete configuration")?;

    let host_key = trust::parse_known_hosts_entry(&config.known_host_entry)
        .context("invalid KNOWN_HOST_SHA entry")?;
    let identity = identity::load_identity(&config.private_key_path, &config.passphrase)
        .await
        .context("unable to load the private key")?;

    let mut options = SessionOptions::new(&config.host, &config.username);
    options.port = config.port;

    let session = RemoteSession::connect(options, identity, HostTrustPolicy::Pinned(host_key))
        .await
        .context("connection failed")?;

    let outcome = RunCommand::new(REMOTE_COMMAND).run(&session).await;
    let closed = session.disconnect().await;

    outcome.with_context(|| format!("remote {REMOTE_COMMAND} failed"))?;
    closed.context("teardown failed")?;
    Ok(())
}
