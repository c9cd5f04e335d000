use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] momentick_core::ValidationError),

    #[error(transparent)]
    Engine(#[from] momentick_core::EngineError),

    #[error(transparent)]
    Universe(#[from] momentick_core::UniverseError),

    #[error(transparent)]
    Gateway(#[from] momentick_core::GatewayError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] momentick_core::ConfigError),

    #[error("no universe workbook configured; pass --universe <PATH> or --mock")]
    MissingUniverse,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Engine(_) | Self::Universe(_) => 3,
            Self::Serialization(_) => 4,
            Self::Config(_) | Self::MissingUniverse => 5,
            Self::Gateway(_) => 6,
            Self::Io(_) => 10,
        }
    }
}
