//! # Status
//!
//! The reply codes the protocol engine branches on, as defined by the File
//! Transfer Protocol.

use thiserror::Error;

#[derive(Debug, Copy, Clone, Error, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
/// Ftp status returned after command execution
pub(crate) enum Status {
    // 1xx: Positive Preliminary Reply
    #[error("data connection already open, transfer starting")]
    AlreadyOpen = 125,
    #[error("file status okay, about to open data connection")]
    AboutToSend = 150,
    // 2xx: Positive Completion Reply
    #[error("command okay")]
    CommandOk = 200,
    #[error("command not implemented, superfluous at this site")]
    CommandNotImplemented = 202,
    #[error("system status, or system help reply")]
    System = 211,
    #[error("file status")]
    File = 213,
    #[error("service ready for new user")]
    Ready = 220,
    #[error("service closing control connection")]
    Closing = 221,
    #[error("closing data connection")]
    ClosingDataConnection = 226,
    #[error("entering extended passive mode")]
    ExtendedPassiveMode = 229,
    #[error("user logged in, proceed")]
    LoggedIn = 230,
    #[error("requested file action okay")]
    RequestedFileActionOk = 250,
    #[error("pathname created")]
    PathCreated = 257,
    // 3xx: Positive Intermediate Reply
    #[error("user name okay, need password")]
    NeedPassword = 331,
    #[error("requested file action pending further information")]
    RequestFilePending = 350,
    // 4xx: Transient Negative Completion Reply
    #[error("service not available, closing control connection")]
    NotAvailable = 421,
    // 5xx: Permanent Negative Completion Reply
    #[error("user not logged in")]
    NotLoggedIn = 530,
    #[error("requested action not taken; file unavailable")]
    FileUnavailable = 550,
    #[error("unknown status code")]
    Unknown = 0,
}

impl Status {
    /// Get status code
    #[allow(dead_code)]
    pub(crate) fn code(&self) -> u16 {
        *self as u16
    }
}

impl From<u16> for Status {
    fn from(code: u16) -> Self {
        match code {
            125 => Self::AlreadyOpen,
            150 => Self::AboutToSend,
            200 => Self::CommandOk,
            202 => Self::CommandNotImplemented,
            211 => Self::System,
            213 => Self::File,
            220 => Self::Ready,
            221 => Self::Closing,
            226 => Self::ClosingDataConnection,
            229 => Self::ExtendedPassiveMode,
            230 => Self::LoggedIn,
            250 => Self::RequestedFileActionOk,
            257 => Self::PathCreated,
            331 => Self::NeedPassword,
            350 => Self::RequestFilePending,
            421 => Self::NotAvailable,
            530 => Self::NotLoggedIn,
            550 => Self::FileUnavailable,
            _ => Self::Unknown,
        }
    }
}
