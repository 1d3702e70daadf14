//! Canonical identifiers derived from file and directory names.
//!
//! SALVO names follow the convention
//! `salvo_<site>_<location>_<instrument>-<logtype>[<rate>]_<YYYYMMDD-HHMMSS>`.
//! The tokens are recovered from free-form instrument output names with
//! ordered substring tables (first match wins) and fixed-width date patterns.

pub mod emlid;
pub mod folder;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use emlid::{
    build_canonical_name, build_canonical_name_with, detect_log_type, detect_log_type_with,
    extract_timestamp, resolve_instrument,
};
pub use folder::{date_from_path, output_path, site_from_path};

/// Identifier token that naming can fail to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Instrument,
    LogType,
    Date,
    Site,
    ProcessingLevel,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::Instrument => "instrument",
            Token::LogType => "log type",
            Token::Date => "date",
            Token::Site => "site",
            Token::ProcessingLevel => "processing level",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while deriving identifiers.
#[derive(Error, Debug, PartialEq)]
pub enum NamingError {
    #[error("unresolvable {token} in '{name}'")]
    Unresolved { token: Token, name: String },

    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),
}

impl NamingError {
    fn unresolved(token: Token, name: &str) -> Self {
        NamingError::Unresolved {
            token,
            name: name.to_string(),
        }
    }
}

/// Result type for naming operations.
pub type Result<T> = std::result::Result<T, NamingError>;

/// Type of log written by an emlid receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Rinex,
    Ubx,
    Raw,
    Llh,
}

impl LogType {
    /// All log types, in default matching priority.
    pub const ALL: [LogType; 4] = [LogType::Rinex, LogType::Ubx, LogType::Raw, LogType::Llh];

    /// Tag used in canonical names.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Rinex => "rinex",
            LogType::Ubx => "ubx",
            LogType::Raw => "raw",
            LogType::Llh => "llh",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
