//! # FTP Regex
//!
//! Regular expressions to parse FTP reply bodies

use lazy_regex::{Lazy, Regex};

/// This regex extracts the port number from the EPSV reply body.
/// The extended-passive response reads `Entering Extended Passive Mode
/// (|||port|)`; the first decimal digit run in the body is the port.
pub static EPSV_PORT_RE: Lazy<Regex> = lazy_regex!(r"(\d+)");

/// This regex extracts a modification timestamp from the MDTM reply body.
pub static MDTM_RE: Lazy<Regex> = lazy_regex!(r"\b(\d{4})(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})\b");

/// This regex extracts the file size from the SIZE reply body.
pub static SIZE_RE: Lazy<Regex> = lazy_regex!(r"(\d+)\s*$");
