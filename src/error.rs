//! Defines the `Error` and `Result` types used by this crate.

use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error returned by the high-level operations of this crate. Modules
/// that can only fail one way return their own error type directly.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// A buffer could not be parsed into a document.
    #[error(transparent)]
    Parse(#[from] crate::tmsh::ParseError),

    /// A block did not hold the shape flattening requires.
    #[error(transparent)]
    Shape(#[from] crate::flatten::ShapeError),

    /// A command run failed.
    #[error(transparent)]
    Exec(#[from] crate::exec::ExecError),

    /// A collector selection could not be resolved.
    #[error(transparent)]
    Registry(#[from] crate::collector::RegistryError),

    /// The tabular sink failed.
    #[error(transparent)]
    Sink(#[from] crate::sink::SinkError),

    /// IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error emitted by serde_json.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
