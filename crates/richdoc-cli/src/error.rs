use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Process exit status for each failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    NotFound = 1,
    InvalidArguments = 2,
    Io = 3,
    InvalidContent = 4,
    Validation = 5,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::NotFound),
            2 => Some(Self::InvalidArguments),
            3 => Some(Self::Io),
            4 => Some(Self::InvalidContent),
            5 => Some(Self::Validation),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    NotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("i/o error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::NotFound(_) => ExitCode::NotFound,
            Self::InvalidArguments(_) => ExitCode::InvalidArguments,
            Self::Io { .. } => ExitCode::Io,
            Self::InvalidContent(_) => ExitCode::InvalidContent,
            Self::Validation(_) => ExitCode::Validation,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
