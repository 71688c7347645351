use crate::archive::ExtractError;
use crate::config::ConfigError;
use crate::mapper::MapError;
use crate::producer::ProduceError;
use crate::walker::WalkError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unable to create staging directory: {0}")]
    Staging(#[source] std::io::Error),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Produce(#[from] ProduceError),
}

pub type Result<T> = std::result::Result<T, Error>;
