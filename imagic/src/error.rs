use thiserror::Error;

/// Failures surfaced by the stereogram and palette engines.
///
/// Every variant aborts the whole run; no partial raster is ever returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("missing input: {what}")]
    MissingInput { what: &'static str },
    /// The very first column of the row already links to a valid source, so there is
    /// no left strip to seed the background from.
    #[error("row {y} has no unlinked left strip to seed the background")]
    DegenerateRow { y: u32 },
    #[error("background index {index} at ({x}, {y}) exceeds background width {width}")]
    IndexOutOfRange {
        x: u32,
        y: u32,
        index: usize,
        width: u32,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("palette cannot be empty")]
    EmptyPalette,
}

pub type Result<T> = std::result::Result<T, GenError>;
