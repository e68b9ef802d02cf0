use async_trait::async_trait;
use russh_sftp::client::SftpSession;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{OperationError, RemoteOperation};
use crate::session::RemoteSession;

/// Creates `/home/<username>/hello/world/test.txt` on the remote host with a
/// single greeting line.
///
/// Partial remote state is left as-is on failure; there is no rollback.
pub struct SftpDrop {
    username: String,
}

impl SftpDrop {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    pub fn target_dir(&self) -> String {
        format!("/home/{}/hello/world", self.username)
    }

    pub fn file_contents(&self) -> Vec<u8> {
        format!("this is written from far far away, {}\n\r", self.username).into_bytes()
    }
}

#[async_trait]
impl RemoteOperation for SftpDrop {
    async fn run(&self, session: &RemoteSession) -> Result<(), OperationError> {
        let channel = session
            .open_channel()
            .await
            .map_err(OperationError::ChannelOpen)?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(OperationError::SftpRequest)?;
        let sftp = SftpSession::new(channel.into_stream()).await?;

        let outcome = self.write_greeting(&sftp).await;
        // Close the sftp session even when the write failed; the write error
        // still wins over a close error.
        let closed = sftp.close().await;
        outcome?;
        closed?;
        Ok(())
    }
}

impl SftpDrop {
    async fn write_greeting(&self, sftp: &SftpSession) -> Result<(), OperationError> {
        let dir = self.target_dir();
        create_dir_all(sftp, &dir).await?;

        let path = format!("{dir}/test.txt");
        let contents = self.file_contents();

        let mut file = sftp.create(path.as_str()).await?;
        file.write_all(&contents).await?;
        file.shutdown().await?;

        info!(bytes = contents.len(), path = %path, "wrote remote file");
        Ok(())
    }
}

/// `mkdir -p` over sftp: create each component root-first, tolerating ones
/// that already exist as directories.
async fn create_dir_all(sftp: &SftpSession, path: &str) -> Result<(), OperationError> {
    for dir in components(path) {
        if sftp.create_dir(dir.as_str()).await.is_ok() {
            debug!(path = %dir, "created remote directory");
            continue;
        }
        match sftp.metadata(dir.as_str()).await {
            Ok(attrs) if attrs.is_dir() => {}
            Ok(_) => return Err(OperationError::NotADirectory(dir)),
            Err(err) => return Err(OperationError::Sftp(err)),
        }
    }
    Ok(())
}

fn components(path: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    let mut current = String::new();
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        current.push('/');
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_dir_embeds_the_username() {
        let op = SftpDrop::new("deploy");
        assert_eq!(op.target_dir(), "/home/deploy/hello/world");
    }

    #[test]
    fn file_contents_match_exactly() {
        let op = SftpDrop::new("deploy");
        assert_eq!(
            op.file_contents(),
            b"this is written from far far away, deploy\n\r".to_vec()
        );
    }

    #[test]
    fn contents_end_with_newline_then_carriage_return() {
        let contents = SftpDrop::new("x").file_contents();
        assert!(contents.ends_with(b"\n\r"));
    }

    #[test]
    fn components_enumerate_root_first() {
        assert_eq!(
            components("/home/deploy/hello/world"),
            vec![
                "/home".to_string(),
                "/home/deploy".to_string(),
                "/home/deploy/hello".to_string(),
                "/home/deploy/hello/world".to_string(),
            ]
        );
    }

    #[test]
    fn components_collapse_duplicate_separators() {
        assert_eq!(
            components("//home//deploy/"),
            vec!["/home".to_string(), "/home/deploy".to_string()]
        );
    }
}
