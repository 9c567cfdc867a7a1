//! # Types
//!
//! Common types shared by the whole crate: the error enum, the server reply
//! and the transfer mode selector.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A shorthand for a Result whose error type is always an [`FtpError`].
pub type FtpResult<T> = std::result::Result<T, FtpError>;

/// `FtpError` is a library-global error type describing everything that can
/// go wrong while talking to an FTP server.
#[derive(Debug, Error)]
pub enum FtpError {
    /// Socket I/O failure on the control or data connection, including
    /// unexpected EOF and short writes.
    #[error("network error: {0}")]
    Network(std::io::Error),
    /// A dial or reply wait exceeded the configured timeout.
    #[error("timed out while {0}")]
    Timeout(&'static str),
    /// The server rejected the login credentials.
    #[error("authentication rejected: {0}")]
    Auth(Reply),
    /// The server answered with a reply code the current command does not
    /// accept.
    #[error("unexpected reply: {0}")]
    Protocol(Reply),
    /// The server sent bytes that do not form a well-formed reply.
    #[error("malformed reply from server")]
    BadReply,
    /// The remote file or directory does not exist.
    #[error("remote path not found: {0}")]
    NotFound(String),
    /// The local download destination already exists and overwriting was not
    /// requested.
    #[error("local destination already exists: {}", .0.display())]
    Exists(PathBuf),
    /// Illegal input, such as an empty path or rename operand.
    #[error("invalid argument: {0}")]
    Argument(String),
    /// The server does not advertise an extension the operation requires.
    #[error("server does not support {0}")]
    FeatureMissing(&'static str),
}

impl FtpError {
    /// Map an I/O error to [`FtpError::Timeout`] or [`FtpError::Network`],
    /// depending on whether the socket deadline elapsed.
    pub(crate) fn from_io(err: std::io::Error, stage: &'static str) -> Self {
        match err.kind() {
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                FtpError::Timeout(stage)
            }
            _ => FtpError::Network(err),
        }
    }

    pub(crate) fn not_connected() -> Self {
        FtpError::Network(std::io::ErrorKind::NotConnected.into())
    }
}

/// A complete reply received on the control channel.
///
/// `text` carries the reply body without the three-digit code; for a
/// multi-line reply it joins the opening line's tail, every intermediate
/// line and the closing line's tail with CRLF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Three-digit reply code, in `100..600`.
    pub code: u16,
    /// Reply body, decoded as UTF-8.
    pub text: String,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    /// 1xx: the command was accepted and a data transfer is about to start.
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// Positive replies (1xx/2xx); the acceptance test for PWD and the CWD
    /// existence probe.
    pub fn is_positive(&self) -> bool {
        self.code < 300
    }

    /// 4xx/5xx: the server refused or failed the request.
    pub fn is_failure(&self) -> bool {
        self.code >= 400
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.text)
    }
}

/// Representation type used for transfers, set with the `TYPE` command.
///
/// Sessions always log in `Binary`; `Text` is kept for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Binary,
    Text,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferMode::Binary => write!(f, "I"),
            TransferMode::Text => write!(f, "A"),
        }
    }
}
