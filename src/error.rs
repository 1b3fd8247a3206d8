use std::fmt;
use std::io;
use std::path::PathBuf;

/// Why a csv file could not be turned into a `Table`.
#[derive(Debug)]
pub enum LoadFailure {
    Io(io::Error),
    /// no header line at all
    Empty,
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailure::Io(e) => write!(f, "{}", e),
            LoadFailure::Empty => write!(f, "file is empty, no header found"),
            LoadFailure::Ragged {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {} has {} fields, the header has {}",
                line, found, expected
            ),
            LoadFailure::InvalidValue {
                line,
                column,
                value,
            } => write!(
                f,
                "line {}, column {}: {:?} is not a number",
                line, column, value
            ),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    /// input file missing, unreadable or not valid csv
    DataLoad { path: PathBuf, failure: LoadFailure },
    /// a required column is not in the header
    MissingColumn { path: PathBuf, column: String },
    /// an output file could not be created or written
    OutputWrite { path: PathBuf, source: io::Error },
    /// the plotting backend failed while drawing
    Render { path: PathBuf, message: String },
    /// invalid game configuration for the solver
    Config { path: PathBuf, message: String },
    Io { path: PathBuf, source: io::Error },
}

impl Error {
    pub(crate) fn load(path: impl Into<PathBuf>, failure: LoadFailure) -> Error {
        Error::DataLoad {
            path: path.into(),
            failure,
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Error {
        Error::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DataLoad { path, failure } => {
                write!(f, "could not load {}: {}", path.display(), failure)
            }
            Error::MissingColumn { path, column } => write!(
                f,
                "required column {:?} not found in {}",
                column,
                path.display()
            ),
            Error::OutputWrite { path, source } => {
                write!(f, "could not write {}: {}", path.display(), source)
            }
            Error::Render { path, message } => {
                write!(f, "could not render {}: {}", path.display(), message)
            }
            Error::Config { path, message } => {
                write!(f, "invalid config {}: {}", path.display(), message)
            }
            Error::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DataLoad {
                failure: LoadFailure::Io(e),
                ..
            } => Some(e),
            Error::OutputWrite { source, .. } | Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
