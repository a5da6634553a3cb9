use std::collections::TryReserveError;
use std::fmt;

/// Represents errors that can occur in the hash table.
#[derive(Debug)]
pub enum Error {
    /// The backing slot array could not be allocated.
    ///
    /// Raised during construction or a resize; a failed resize leaves the
    /// table in its previous valid state.
    Alloc(TryReserveError),

    /// The probe visited every slot without finding an open one.
    ///
    /// Cannot be reached while the growth policy is in effect, but is
    /// surfaced as an error rather than looping forever.
    TableExhausted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Alloc(e) => write!(f, "slot array allocation failed: {e}"),
            Error::TableExhausted => write!(f, "no open slot within table capacity"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Alloc(e) => Some(e),
            Error::TableExhausted => None,
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(value: TryReserveError) -> Self {
        Self::Alloc(value)
    }
}

/// Table result.
pub type Result<T> = std::result::Result<T, Error>;
