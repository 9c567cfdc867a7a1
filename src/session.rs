//! # Session
//!
//! The protocol engine: one method per FTP operation. Every method performs
//! a fixed write/reply dialogue on the control channel; transfer operations
//! additionally negotiate a passive-mode data connection, move the payload
//! and consume the transfer-completion reply before returning.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::command::Command;
use crate::config::ConnectionConfig;
use crate::control::ControlChannel;
use crate::data::DataChannel;
use crate::features::FeatureSet;
use crate::list::{self, DirEntry};
use crate::regex::{EPSV_PORT_RE, MDTM_RE, SIZE_RE};
use crate::status::Status;
use crate::types::{FtpError, FtpResult, Reply, TransferMode};

/// An authenticated FTP session over one control connection.
///
/// Commands execute strictly one at a time; each consumes exactly the
/// replies its dialogue expects, so the reply queue is empty between
/// commands.
pub struct FtpSession {
    channel: ControlChannel,
    features: FeatureSet,
    welcome_msg: Option<String>,
    config: ConnectionConfig,
}

impl FtpSession {
    /// Connect and run the whole login handshake: greeting, USER/PASS,
    /// feature negotiation, `OPTS UTF8 ON` when advertised, and `TYPE I`.
    pub fn connect(config: &ConnectionConfig) -> FtpResult<Self> {
        config.validate()?;
        let mut channel =
            ControlChannel::connect(&config.host, config.port, config.timeout, config.timeout)?;

        let greeting = channel.recv_reply()?;
        if Status::from(greeting.code) != Status::Ready {
            return Err(FtpError::Protocol(greeting));
        }
        debug!("server ready: {}", greeting.text);

        let mut session = Self {
            channel,
            features: FeatureSet::default(),
            welcome_msg: Some(greeting.text),
            config: config.clone(),
        };
        session.login()?;
        Ok(session)
    }

    fn login(&mut self) -> FtpResult<()> {
        let user = self.config.user.clone();
        let password = self.config.password.clone();
        debug!("logging in as '{user}'");

        self.channel.send_line(&Command::User(user).to_string())?;
        let reply = self.channel.recv_reply()?;
        match Status::from(reply.code) {
            Status::NeedPassword => {
                self.channel
                    .send_line(&Command::Pass(password).to_string())?;
                let reply = self.channel.recv_reply()?;
                match Status::from(reply.code) {
                    Status::LoggedIn => {}
                    Status::NotLoggedIn => return Err(FtpError::Auth(reply)),
                    _ => return Err(FtpError::Protocol(reply)),
                }
            }
            // some servers let anonymous users in without a password
            Status::LoggedIn => {}
            Status::NotLoggedIn => return Err(FtpError::Auth(reply)),
            _ => return Err(FtpError::Protocol(reply)),
        }
        debug!("login OK");

        self.features = self.negotiate_features()?;
        if self.features.utf8 {
            self.command_accepted(Command::Opts("UTF8".to_string(), Some("ON".to_string())))?;
        }
        self.transfer_type(TransferMode::Binary)?;
        Ok(())
    }

    fn negotiate_features(&mut self) -> FtpResult<FeatureSet> {
        self.channel.send_line(&Command::Feat.to_string())?;
        let reply = self.channel.recv_reply()?;
        if Status::from(reply.code) != Status::System {
            return Err(FtpError::Protocol(reply));
        }
        Ok(FeatureSet::from_feat_text(&reply.text))
    }

    /// Extensions advertised by the server during login.
    pub fn features(&self) -> FeatureSet {
        self.features
    }

    /// Greeting text sent by the server on connect.
    pub fn welcome_msg(&self) -> Option<&str> {
        self.welcome_msg.as_deref()
    }

    /// Whether the control connection is still usable.
    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// This does nothing; used to keep the connection alive while idle.
    pub fn noop(&mut self) -> FtpResult<()> {
        debug!("pinging server");
        self.command_ok(Command::Noop).map(|_| ())
    }

    /// Sets the representation type for transfers (`TYPE` command).
    pub fn transfer_type(&mut self, mode: TransferMode) -> FtpResult<()> {
        debug!("setting transfer type {mode}");
        self.command_ok(Command::Type(mode)).map(|_| ())
    }

    /// Quits the session and closes the control connection.
    pub fn quit(&mut self) -> FtpResult<()> {
        debug!("quitting session");
        self.channel.send_line(&Command::Quit.to_string())?;
        let reply = self.channel.recv_reply()?;
        self.channel.close();
        match Status::from(reply.code) {
            Status::Closing => Ok(()),
            _ => Err(FtpError::Protocol(reply)),
        }
    }

    /// Change the working directory. A refusal is not an error: the boolean
    /// answers "did the server accept the change", which doubles as the
    /// directory-existence probe.
    pub fn cwd(&mut self, path: &str) -> FtpResult<bool> {
        debug!("changing working directory to {path}");
        self.channel
            .send_line(&Command::Cwd(path.to_string()).to_string())?;
        let reply = self.channel.recv_reply()?;
        Ok(reply.is_positive())
    }

    /// Move to the parent directory.
    pub fn cdup(&mut self) -> FtpResult<()> {
        debug!("going to parent directory");
        self.channel.send_line(&Command::Cdup.to_string())?;
        let reply = self.channel.recv_reply()?;
        if reply.is_failure() {
            return Err(FtpError::Protocol(reply));
        }
        Ok(())
    }

    /// Get the current working directory from the quoted `PWD` reply.
    pub fn pwd(&mut self) -> FtpResult<String> {
        debug!("getting working directory");
        self.channel.send_line(&Command::Pwd.to_string())?;
        let reply = self.channel.recv_reply()?;
        if !reply.is_positive() {
            return Err(FtpError::Protocol(reply));
        }
        match (reply.text.find('"'), reply.text.rfind('"')) {
            (Some(begin), Some(end)) if begin < end => {
                Ok(reply.text[begin + 1..end].to_string())
            }
            _ => Err(FtpError::BadReply),
        }
    }

    /// Create a directory on the server.
    pub fn mkd(&mut self, path: &str) -> FtpResult<()> {
        debug!("creating directory {path}");
        self.channel
            .send_line(&Command::Mkd(path.to_string()).to_string())?;
        let reply = self.channel.recv_reply()?;
        match Status::from(reply.code) {
            Status::PathCreated => Ok(()),
            _ => Err(FtpError::Protocol(reply)),
        }
    }

    /// Remove a directory.
    pub fn rmd(&mut self, path: &str) -> FtpResult<()> {
        debug!("removing directory {path}");
        self.channel
            .send_line(&Command::Rmd(path.to_string()).to_string())?;
        let reply = self.channel.recv_reply()?;
        match Status::from(reply.code) {
            Status::RequestedFileActionOk => Ok(()),
            Status::FileUnavailable => Err(FtpError::NotFound(path.to_string())),
            _ => Err(FtpError::Protocol(reply)),
        }
    }

    /// Remove a file.
    pub fn dele(&mut self, path: &str) -> FtpResult<()> {
        debug!("removing file {path}");
        self.channel
            .send_line(&Command::Dele(path.to_string()).to_string())?;
        let reply = self.channel.recv_reply()?;
        match Status::from(reply.code) {
            Status::RequestedFileActionOk => Ok(()),
            Status::FileUnavailable => Err(FtpError::NotFound(path.to_string())),
            _ => Err(FtpError::Protocol(reply)),
        }
    }

    /// Rename `from` to `to` with the RNFR/RNTO pair.
    pub fn rename(&mut self, from: &str, to: &str) -> FtpResult<()> {
        debug!("renaming '{from}' to '{to}'");
        self.channel
            .send_line(&Command::RenameFrom(from.to_string()).to_string())?;
        let reply = self.channel.recv_reply()?;
        match Status::from(reply.code) {
            Status::RequestFilePending => {}
            Status::FileUnavailable => return Err(FtpError::NotFound(from.to_string())),
            _ => return Err(FtpError::Protocol(reply)),
        }
        self.channel
            .send_line(&Command::RenameTo(to.to_string()).to_string())?;
        let reply = self.channel.recv_reply()?;
        match Status::from(reply.code) {
            Status::RequestedFileActionOk => Ok(()),
            Status::FileUnavailable => Err(FtpError::NotFound(to.to_string())),
            _ => Err(FtpError::Protocol(reply)),
        }
    }

    /// File size in bytes. Requires the `SIZE` feature.
    pub fn size(&mut self, path: &str) -> FtpResult<u64> {
        if !self.features.size {
            return Err(FtpError::FeatureMissing("SIZE"));
        }
        debug!("getting file size for {path}");
        self.channel
            .send_line(&Command::Size(path.to_string()).to_string())?;
        let reply = self.channel.recv_reply()?;
        match Status::from(reply.code) {
            Status::File => SIZE_RE
                .captures(&reply.text)
                .and_then(|caps| caps[1].parse::<u64>().ok())
                .ok_or(FtpError::BadReply),
            Status::FileUnavailable => Err(FtpError::NotFound(path.to_string())),
            _ => Err(FtpError::Protocol(reply)),
        }
    }

    /// Last modification time. Requires the `MDTM` feature.
    pub fn mdtm(&mut self, path: &str) -> FtpResult<DateTime<Utc>> {
        if !self.features.mdtm {
            return Err(FtpError::FeatureMissing("MDTM"));
        }
        debug!("getting modification time for {path}");
        self.channel
            .send_line(&Command::Mdtm(path.to_string()).to_string())?;
        let reply = self.channel.recv_reply()?;
        match Status::from(reply.code) {
            Status::File => parse_mdtm_stamp(&reply.text).ok_or(FtpError::BadReply),
            Status::FileUnavailable => Err(FtpError::NotFound(path.to_string())),
            _ => Err(FtpError::Protocol(reply)),
        }
    }

    /// Set the modification time. Requires the `MFMT` feature.
    pub fn mfmt(&mut self, path: &str, stamp: DateTime<Utc>) -> FtpResult<()> {
        if !self.features.mfmt {
            return Err(FtpError::FeatureMissing("MFMT"));
        }
        debug!("setting modification time of {path}");
        self.channel
            .send_line(&Command::Mfmt(stamp, path.to_string()).to_string())?;
        let reply = self.channel.recv_reply()?;
        match Status::from(reply.code) {
            Status::File => Ok(()),
            Status::FileUnavailable => Err(FtpError::NotFound(path.to_string())),
            _ => Err(FtpError::Protocol(reply)),
        }
    }

    /// List the directory at `path` (or the working directory), preferring
    /// `MLSD` when the server advertises it and falling back to the Unix
    /// `LIST` format otherwise.
    pub fn list_dir(&mut self, path: Option<&str>) -> FtpResult<Vec<DirEntry>> {
        let arg = normalize_path_arg(path);
        debug!(
            "reading {} directory content",
            arg.as_deref().unwrap_or("working")
        );
        let use_mlsd = self.features.mlsd;
        let command = if use_mlsd {
            Command::Mlsd(arg)
        } else {
            Command::List(arg)
        };
        let data = self.transfer_command(command)?;
        let payload = data.read_to_end()?;
        self.finish_transfer()?;

        let text = String::from_utf8_lossy(&payload);
        Ok(if use_mlsd {
            list::parse_mlsd_listing(&text)
        } else {
            list::parse_unix_listing(&text)
        })
    }

    /// Upload the local file at `local` to `remote`, reporting the running
    /// byte count to `on_progress` per chunk. Returns the bytes sent.
    pub fn stor<F>(&mut self, remote: &str, local: &Path, on_progress: F) -> FtpResult<u64>
    where
        F: FnMut(u64),
    {
        debug!("storing {} as {remote}", local.display());
        let data = self.transfer_command(Command::Stor(remote.to_string()))?;
        let sent = data.upload_from(local, on_progress)?;
        self.finish_transfer()?;
        Ok(sent)
    }

    /// Download `remote` into the local file at `local`, reporting each
    /// chunk's size to `on_chunk`. Returns the bytes received.
    pub fn retr<F>(&mut self, remote: &str, local: &Path, on_chunk: F) -> FtpResult<u64>
    where
        F: FnMut(u64),
    {
        debug!("retrieving {remote} into {}", local.display());
        let data = self.transfer_command(Command::Retr(remote.to_string()))?;
        let received = data.download_to(local, on_chunk)?;
        self.finish_transfer()?;
        Ok(received)
    }

    /// Send a command that completes with exactly code 200, as `TYPE` and
    /// `NOOP` do.
    fn command_ok(&mut self, command: Command) -> FtpResult<Reply> {
        self.channel.send_line(&command.to_string())?;
        let reply = self.channel.recv_reply()?;
        match Status::from(reply.code) {
            Status::CommandOk => Ok(reply),
            _ => Err(FtpError::Protocol(reply)),
        }
    }

    /// Send a command for which any positive completion (2xx) reply counts
    /// as success. `OPTS` in particular gets 200 or 202 depending on the
    /// server.
    fn command_accepted(&mut self, command: Command) -> FtpResult<Reply> {
        self.channel.send_line(&command.to_string())?;
        let reply = self.channel.recv_reply()?;
        if reply.code / 100 == 2 {
            Ok(reply)
        } else {
            Err(FtpError::Protocol(reply))
        }
    }

    // -- data channel plumbing

    /// Negotiate a passive data connection, then issue `command` on the
    /// control channel and wait for the preliminary reply. The data channel
    /// is dropped (and so closed) on every refusal path.
    fn transfer_command(&mut self, command: Command) -> FtpResult<DataChannel> {
        let data = self.open_data_channel()?;
        self.channel.send_line(&command.to_string())?;
        match self.channel.recv_reply() {
            Ok(reply)
                if matches!(
                    Status::from(reply.code),
                    Status::AlreadyOpen | Status::AboutToSend
                ) =>
            {
                Ok(data)
            }
            Ok(reply) => Err(FtpError::Protocol(reply)),
            Err(e) => Err(e),
        }
    }

    /// Consume the transfer-completion reply that follows the data-channel
    /// EOF.
    fn finish_transfer(&mut self) -> FtpResult<()> {
        let reply = self.channel.recv_reply()?;
        if reply.is_failure() {
            return Err(FtpError::Protocol(reply));
        }
        trace!("transfer complete: {reply}");
        Ok(())
    }

    /// Enter extended passive mode and connect to the returned port on the
    /// control peer's host. EPSV is attempted whether or not the server
    /// advertised it; plenty of servers support it silently.
    fn open_data_channel(&mut self) -> FtpResult<DataChannel> {
        self.channel.send_line(&Command::Epsv.to_string())?;
        let reply = self.channel.recv_reply()?;
        if Status::from(reply.code) != Status::ExtendedPassiveMode {
            return Err(FtpError::Protocol(reply));
        }
        // reply body is `Entering Extended Passive Mode (|||port|)`; the
        // first digit run is the port
        let port = EPSV_PORT_RE
            .captures(&reply.text)
            .and_then(|caps| caps[1].parse::<u16>().ok())
            .ok_or(FtpError::BadReply)?;
        trace!("EPSV port: {port}");
        let mut addr = self.channel.peer_addr()?;
        addr.set_port(port);
        DataChannel::connect(addr, self.config.timeout, self.config.timeout)
    }
}

/// Listing path arguments: empty or whitespace-only means "the working
/// directory", expressed on the wire by omitting the argument.
fn normalize_path_arg(path: Option<&str>) -> Option<String> {
    match path {
        Some(p) if !p.trim().is_empty() => Some(p.to_string()),
        _ => None,
    }
}

/// `YYYYMMDDHHMMSS` anywhere in the MDTM reply body, as a UTC timestamp.
fn parse_mdtm_stamp(body: &str) -> Option<DateTime<Utc>> {
    let caps = MDTM_RE.captures(body)?;
    let date = NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )?;
    let time = NaiveTime::from_hms_opt(
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
        caps[6].parse().ok()?,
    )?;
    Some(NaiveDateTime::new(date, time).and_utc())
}
