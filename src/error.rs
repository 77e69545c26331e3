//! Errors raised while filtering a document.

use std::io;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No backend recognizes the file
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("DOCX error: {0}")]
    Docx(String),

    #[error("EPUB error: {0}")]
    Epub(String),

    #[error("ZIP archive error: {0}")]
    Archive(String),

    #[error("Extraction timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The backend worker died without reporting a result
    #[error("Filter engine failure: {0}")]
    Engine(String),

    /// The reader was dropped while the worker was still producing lines
    #[error("Reader closed")]
    ReaderClosed,
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Pdf(err.to_string())
    }
}
