use std::io;

// sysexits(3) status codes.
pub const EX_USAGE: i32 = 64;
pub const EX_DATAERR: i32 = 65;
pub const EX_NOINPUT: i32 = 66;
pub const EX_SOFTWARE: i32 = 70;
pub const EX_OSERR: i32 = 71;
pub const EX_IOERR: i32 = 74;

/// Errors returned by [`crate::parsev`], [`crate::parsel`] and [`crate::Parser`].
///
/// Every variant carries the fully formatted, user-facing message.  The
/// variant itself selects the process exit status (see [`Error::exit_code`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed command line: unknown option, missing option argument,
    /// mutually exclusive options, wrong number of positional arguments.
    #[error("{0}")]
    Usage(String),

    /// A value failed conversion, a quote was left open, or an option
    /// table violates its construction rules.
    #[error("{0}")]
    DataFormat(String),

    /// An internal invariant was broken (a table/caller bug, not user input).
    #[error("{0}")]
    Software(String),

    /// Allocation failure while building the scanner configuration.
    #[error("{0}")]
    NoMemory(String),

    /// A file-open conversion failed.
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The sysexits(3) status a command-line program should exit with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => EX_USAGE,
            Error::DataFormat(_) => EX_DATAERR,
            Error::Software(_) => EX_SOFTWARE,
            Error::NoMemory(_) => EX_OSERR,
            Error::Io { .. } => EX_NOINPUT,
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(e: std::collections::TryReserveError) -> Self {
        Error::NoMemory(format!("unable to allocate scanner configuration: {}", e))
    }
}
