use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors the simulator distinguishes between. Everything an agent hits at
/// runtime is logged and survived; only `Usage` is fatal, and only at startup.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure talking to the update server.
    #[error("network error: {0}")]
    Network(String),

    /// The server reply could not be decoded into a response document.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A request document failed to serialize.
    #[error("request encoding error: {0}")]
    Encode(String),

    /// Invalid startup configuration, rejected before any agent spawns.
    #[error("usage error: {0}")]
    Usage(String),
}
