//! Venue error types.

/// Errors that can occur talking to venue collaborators.
///
/// All of these are treated as transient by the engine: it propagates them to
/// the caller of the enclosing operation and never retries internally.
#[derive(Debug, thiserror::Error)]
pub enum VenueError {
    #[error("price feed error: {0}")]
    PriceFeed(String),

    #[error("balance lookup error: {0}")]
    Balance(String),

    #[error("trading rights lookup error: {0}")]
    Rights(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("{0}")]
    Other(String),
}
