mod command;
mod transfer;

pub use command::RunCommand;
pub use transfer::SftpDrop;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::RemoteSession;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("failed to open session channel: {0}")]
    ChannelOpen(#[source] russh::Error),
    #[error("sftp subsystem request failed: {0}")]
    SftpRequest(#[source] russh::Error),
    #[error("sftp request failed: {0}")]
    Sftp(#[from] russh_sftp::client::error::Error),
    #[error("remote path {0} exists and is not a directory")]
    NotADirectory(String),
    #[error("failed to forward remote output: {0}")]
    LocalIo(#[from] std::io::Error),
    #[error("channel error: {0}")]
    Channel(#[from] russh::Error),
    #[error("remote command exited with status {status}")]
    CommandFailed { status: u32 },
}

/// One remote action performed over an established [`RemoteSession`].
///
/// Implementations open their own handles on the session and close them in
/// reverse acquisition order before returning, attempting every close even
/// when an earlier step failed. Exactly one operation runs per session.
#[async_trait]
pub trait RemoteOperation {
    async fn run(&self, session: &RemoteSession) -> Result<(), OperationError>;
}
