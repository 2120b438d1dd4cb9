pub mod config;
pub mod page;
pub mod protocol;
pub mod transport;

pub use config::ConfigError;
pub use page::PageError;
pub use protocol::ProtocolError;
pub use transport::TransportError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Page(#[from] PageError),
}
