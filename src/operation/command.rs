use async_trait::async_trait;
use russh::ChannelMsg;
use tokio::io::{self, AsyncWriteExt};
use tracing::debug;

use super::{OperationError, RemoteOperation};
use crate::session::RemoteSession;

/// Runs one command remotely, forwarding its output and error streams to the
/// local process streams as data arrives.
pub struct RunCommand {
    command: String,
}

impl RunCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl RemoteOperation for RunCommand {
    async fn run(&self, session: &RemoteSession) -> Result<(), OperationError> {
        let mut channel = session
            .open_channel()
            .await
            .map_err(OperationError::ChannelOpen)?;
        channel.exec(true, self.command.as_str()).await?;

        let mut stdout = io::stdout();
        let mut stderr = io::stderr();
        let mut exit_status = None;

        // Forward each chunk as it arrives rather than buffering the run.
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => {
                    stdout.write_all(data).await?;
                    stdout.flush().await?;
                }
                ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                    stderr.write_all(data).await?;
                    stderr.flush().await?;
                }
                ChannelMsg::ExitStatus { exit_status: status } => {
                    exit_status = Some(status);
                }
                _ => {}
            }
        }

        debug!(command = %self.command, status = ?exit_status, "remote command finished");
        match exit_status {
            Some(status) if status != 0 => Err(OperationError::CommandFailed { status }),
            _ => Ok(()),
        }
    }
}
