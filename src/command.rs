//! # Command
//!
//! The set of FTP commands and their wire forms

use std::fmt;

use chrono::{DateTime, Utc};

use crate::types::TransferMode;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ftp commands with their arguments
pub(crate) enum Command {
    /// Change directory to parent directory
    Cdup,
    /// Change working directory
    Cwd(String),
    /// Remove file at specified path
    Dele(String),
    /// Extended passive mode <https://www.rfc-editor.org/rfc/rfc2428#section-3>
    Epsv,
    /// Query the extensions supported by the server
    Feat,
    /// List entries at specified path. If path is not provided list entries at current working directory
    List(Option<String>),
    /// Get modification time for file at specified path
    Mdtm(String),
    /// Set modification time for file at specified path
    Mfmt(DateTime<Utc>, String),
    /// Make directory
    Mkd(String),
    /// Machine-readable listing of entries at specified path. If path is not provided list entries at current working directory
    Mlsd(Option<String>),
    /// Ping server
    Noop,
    /// Set an option, with an optional value
    Opts(String, Option<String>),
    /// Provide login password
    Pass(String),
    /// Print working directory
    Pwd,
    /// Quit
    Quit,
    /// Select file to rename
    RenameFrom(String),
    /// Rename selected file to
    RenameTo(String),
    /// Retrieve file
    Retr(String),
    /// Remove directory
    Rmd(String),
    /// Get file size of specified path
    Size(String),
    /// Put file at specified path
    Stor(String),
    /// Set transfer type
    Type(TransferMode),
    /// Provide user to login as
    User(String),
}

// -- stringify
// CRLF is appended by the control channel, not here.

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cdup => write!(f, "CDUP"),
            Self::Cwd(d) => write!(f, "CWD {d}"),
            Self::Dele(p) => write!(f, "DELE {p}"),
            Self::Epsv => write!(f, "EPSV"),
            Self::Feat => write!(f, "FEAT"),
            Self::List(p) => match p.as_deref() {
                Some(p) => write!(f, "LIST {p}"),
                None => write!(f, "LIST"),
            },
            Self::Mdtm(p) => write!(f, "MDTM {p}"),
            Self::Mfmt(stamp, p) => write!(f, "MFMT {} {p}", stamp.format("%Y%m%d%H%M%S")),
            Self::Mkd(p) => write!(f, "MKD {p}"),
            Self::Mlsd(p) => match p.as_deref() {
                Some(p) => write!(f, "MLSD {p}"),
                None => write!(f, "MLSD"),
            },
            Self::Noop => write!(f, "NOOP"),
            Self::Opts(opt, value) => match value.as_deref() {
                Some(value) => write!(f, "OPTS {opt} {value}"),
                None => write!(f, "OPTS {opt}"),
            },
            Self::Pass(p) => write!(f, "PASS {p}"),
            Self::Pwd => write!(f, "PWD"),
            Self::Quit => write!(f, "QUIT"),
            Self::RenameFrom(p) => write!(f, "RNFR {p}"),
            Self::RenameTo(p) => write!(f, "RNTO {p}"),
            Self::Retr(p) => write!(f, "RETR {p}"),
            Self::Rmd(p) => write!(f, "RMD {p}"),
            Self::Size(p) => write!(f, "SIZE {p}"),
            Self::Stor(p) => write!(f, "STOR {p}"),
            Self::Type(t) => write!(f, "TYPE {t}"),
            Self::User(u) => write!(f, "USER {u}"),
        }
    }
}
