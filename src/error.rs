use thiserror::Error;

/// Errors that can occur while extracting, storing, or serving recipes
#[derive(Error, Debug)]
pub enum KeeperError {
    /// An HTTP call to an upstream service failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The generative model call failed or returned an unusable response
    #[error("Model call failed: {0}")]
    Model(String),

    /// The model output survived no repair attempt
    #[error("Could not parse model output: {0}")]
    UnparseableOutput(String),

    /// User input rejected before any network call was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Document store error
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),

    /// The store accepted the call but produced no usable result
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A required secret is absent; fatal at startup
    #[error("Missing configuration: {0} must be set")]
    MissingConfig(&'static str),

    /// I/O error while starting the server
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
