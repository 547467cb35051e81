/// The failure kinds the review core can surface. Everything that crosses a
/// module boundary is one of these; the binary wraps them with `anyhow` for
/// its single-line fatal diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configured path is missing or a numeric bound was violated.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The upstream parser handed us a record we cannot review.
    #[error("unusable game record: {0}")]
    SgfParse(String),

    /// A replay asked to play on an intersection that is not open.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// The engine child could not start, or never reported readiness.
    #[error("failed to launch the engine: {0}")]
    EngineLaunch(String),

    /// The engine wrote something that does not decode against the wire
    /// schema, or the streams ended before every expected response arrived.
    #[error("engine protocol violation: {0}")]
    EngineProtocol(String),

    /// A query was written before the readiness sentinel or after a kill.
    #[error("the engine is not ready to accept queries")]
    NotReady,

    /// A coordinate was built from off-board values.
    #[error("coordinate out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
