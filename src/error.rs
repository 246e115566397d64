//! Error taxonomy (SPEC_FULL.md §7). Most of the taxonomy in spec.md §7 is
//! not an `Err` at all — non-synchronizing, already-converged, and
//! algorithm-incompatibility-after-reduction are result states or silent
//! skips, handled directly on `AlgoResult`. Only the three genuinely
//! fatal-for-the-call cases get a typed variant here.

use std::fmt;

#[derive(Debug)]
pub enum SynchroError {
    InvalidInput(String),
    InvalidConfiguration(String),
    OutOfMemory,
}

impl fmt::Display for SynchroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynchroError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            SynchroError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            SynchroError::OutOfMemory => write!(f, "memory budget exceeded"),
        }
    }
}

impl std::error::Error for SynchroError {}
