pub mod config;
pub mod identity;
pub mod logging;
pub mod operation;
pub mod session;
pub mod trust;

pub use config::RunConfig;
pub use session::{RemoteSession, SessionOptions};
pub use trust::HostTrustPolicy;
