use super::{ffi, function::Kind, value::ValueType};
use std::ffi::{c_int, CStr};

/// All of the ways that loading, evaluating, or querying can fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A bundle could not be resolved, read, or parsed.
    #[error("failed to load bundle {bundle}: {reason}")]
    Load { bundle: String, reason: String },
    /// The bundle name is already loaded and has not been unloaded.
    #[error("bundle {0} is already loaded")]
    AlreadyLoaded(String),
    /// A function with this name is already registered and overwriting is disallowed.
    #[error("function {0} is already registered")]
    DuplicateName(String),
    /// No function or bundle with this name exists.
    #[error("{0} not found")]
    NotFound(String),
    #[error("{name}() takes {expected} arguments but {actual} were given")]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("argument {position} of {name}() must be {expected}, found {actual}")]
    TypeMismatch {
        name: String,
        position: usize,
        expected: Kind,
        actual: ValueType,
    },
    /// The function implementation failed. The original failure is the source.
    #[error("{name}() failed: {source}")]
    Evaluation {
        name: String,
        #[source]
        source: Box<Error>,
    },
    /// The SQL engine reported a parse or execution failure. `code` is the SQLite result
    /// code and `message` is SQLite's description of the failure, unmodified.
    #[error("{message} (SQLite error {code})")]
    Query { code: c_int, message: String },
    /// An argument was well-typed but its contents are not acceptable.
    #[error("{0}")]
    InvalidInput(String),
    /// A query template referenced a placeholder that was not provided.
    #[error("missing value for placeholder ${{{0}}}")]
    Template(String),
    /// A query template has a `$` that does not start a placeholder or an escaped `$$`.
    #[error("invalid placeholder in query template at line {line}, column {column}")]
    InvalidPlaceholder { line: usize, column: usize },
    #[error(transparent)]
    Utf8Error(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert an SQLite result code into a Result, reading the error message from the
    /// connection.
    ///
    /// # Safety
    ///
    /// The connection pointer must be valid, or null.
    pub unsafe fn from_sqlite_desc(rc: c_int, db: *mut ffi::sqlite3) -> Result<()> {
        match rc {
            ffi::SQLITE_OK | ffi::SQLITE_ROW | ffi::SQLITE_DONE => Ok(()),
            _ => Err(Error::Query {
                code: rc,
                message: if db.is_null() {
                    ffi::errstr(rc)
                } else {
                    CStr::from_ptr(ffi::sqlite3_errmsg(db))
                        .to_string_lossy()
                        .into_owned()
                },
            }),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Error {
        Error::InvalidInput(message.into())
    }

    pub(crate) fn load(bundle: impl Into<String>, reason: impl ToString) -> Error {
        Error::Load {
            bundle: bundle.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
