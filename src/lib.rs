#![crate_name = "ftpwire"]
#![crate_type = "lib"]

//! # ftpwire
//!
//! ftpwire is an FTP client library written in Rust. It speaks the classic
//! RFC 959 dialogue over a persistent control connection and moves payloads
//! over short-lived passive-mode data connections, negotiating the widely
//! deployed server extensions (EPSV, FEAT, MLSD/MLST, MDTM, MFMT, SIZE, UTF8,
//! OPTS) during login.
//!
//! The crate has two layers:
//!
//! - [`FtpSession`] is the protocol engine: one method per FTP operation,
//!   with strict request/response pairing on the control channel and a fresh
//!   data connection per transfer.
//! - [`FtpClient`] is the high-level facade: directory navigation, listings,
//!   upload/download with progress callbacks, recursive make/remove
//!   directory, existence probes and modification-time management.
//!
//! ## Get started
//!
//! ```no_run
//! use ftpwire::{ConnectionConfig, FtpClient};
//!
//! let mut client = FtpClient::with_config(ConnectionConfig {
//!     host: "ftp.example.com".to_string(),
//!     ..ConnectionConfig::default()
//! });
//! client.connect().unwrap();
//! for entry in client.get_files(Some("/pub")).unwrap() {
//!     println!("{} ({} bytes)", entry.name(), entry.size());
//! }
//! client.disconnect().unwrap();
//! ```
//!
//! ## Transfers and progress
//!
//! ```no_run
//! use std::path::Path;
//! use ftpwire::FtpClient;
//!
//! let mut client = FtpClient::new();
//! client.connect().unwrap();
//! let mut on_progress = |current: u64, total: u64| {
//!     println!("{current}/{total}");
//! };
//! client
//!     .download("/pub/archive.tar", Path::new("archive.tar"), false, Some(&mut on_progress))
//!     .unwrap();
//! ```

// -- common deps
#[macro_use]
extern crate lazy_regex;
#[macro_use]
extern crate log;

// -- private
mod client;
mod command;
mod config;
mod control;
mod data;
mod features;
mod regex;
mod reply;
mod session;
mod status;

// -- public
pub mod list;
pub mod types;

pub use client::{FtpClient, ProgressFn};
pub use config::ConnectionConfig;
pub use features::FeatureSet;
pub use list::{DirEntry, EntryKind};
pub use session::FtpSession;
pub use types::{FtpError, FtpResult, Reply, TransferMode};

// -- test logging
#[cfg(test)]
pub fn log_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
