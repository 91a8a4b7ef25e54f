/// Result alias that carries the crate's [`VinesError`].
pub type Result<T> = std::result::Result<T, VinesError>;

#[derive(Debug, thiserror::Error)]
pub enum VinesError {
    /// The tempo schedule cannot describe a strictly increasing time mapping,
    /// either because it is empty or because a point carries a bpm that is
    /// zero, negative or not finite.
    #[error("invalid tempo map: {0}")]
    InvalidTempoMap(String),
    /// A chart file parsed but holds values the engine cannot place.
    #[error("invalid chart: {0}")]
    InvalidChart(String),
    /// Caller supplied an argument outside the accepted domain.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Chart, config or input files that failed to (de)serialise.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
