//! Exit codes for the CLI tool.

use mscz_rename::{Error, ErrorKind};

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Not a readable score archive
pub const BAD_ARCHIVE: i32 = 3;
/// No track names in the score
pub const NOT_FOUND: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Rejected edit request
pub const VALIDATION: i32 = 6;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    NotFound,
    IoError,
    Validation,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::NotFound => NOT_FOUND,
            Self::IoError => IO_ERROR,
            Self::Validation => VALIDATION,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a library error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error.kind() {
        ErrorKind::Format => ExitCode::BadArchive,
        ErrorKind::NotFound => ExitCode::NotFound,
        ErrorKind::Validation => ExitCode::Validation,
        ErrorKind::Io => ExitCode::IoError,
    }
}
