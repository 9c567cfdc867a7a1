//! # Control channel
//!
//! Owner of the control socket. Outbound lines go through [`send_line`];
//! inbound bytes are fed to the reply parser and queued as complete replies
//! for [`recv_reply`]. At most one command is in flight at a time, so the
//! queue drains strictly in arrival order.
//!
//! [`send_line`]: ControlChannel::send_line
//! [`recv_reply`]: ControlChannel::recv_reply

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::reply::ReplyParser;
use crate::types::{FtpError, FtpResult, Reply};

pub(crate) struct ControlChannel {
    stream: TcpStream,
    parser: ReplyParser,
    queue: VecDeque<Reply>,
    reply_timeout: Duration,
    destroyed: bool,
}

impl ControlChannel {
    /// Open the control connection. The server greeting is not consumed
    /// here; the session reads it as its first reply.
    pub(crate) fn connect(
        host: &str,
        port: u16,
        dial_timeout: Duration,
        reply_timeout: Duration,
    ) -> FtpResult<Self> {
        debug!("connecting to {host}:{port}");
        let addrs = (host, port).to_socket_addrs().map_err(FtpError::Network)?;
        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, dial_timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let stream = match (stream, last_err) {
            (Some(s), _) => s,
            (None, Some(e)) => return Err(FtpError::from_io(e, "dialing control connection")),
            (None, None) => {
                return Err(FtpError::Network(
                    std::io::ErrorKind::AddrNotAvailable.into(),
                ))
            }
        };
        debug!("control connection established");
        Ok(Self {
            stream,
            parser: ReplyParser::new(),
            queue: VecDeque::new(),
            reply_timeout,
            destroyed: false,
        })
    }

    /// Write one command line, CRLF appended. Returns the number of bytes
    /// put on the wire.
    pub(crate) fn send_line(&mut self, line: &str) -> FtpResult<usize> {
        if self.destroyed {
            return Err(FtpError::not_connected());
        }
        trace!("C: {line}");
        let mut wire = String::with_capacity(line.len() + 2);
        wire.push_str(line);
        wire.push_str("\r\n");
        if let Err(e) = self
            .stream
            .write_all(wire.as_bytes())
            .and_then(|_| self.stream.flush())
        {
            self.fail();
            return Err(FtpError::Network(e));
        }
        Ok(wire.len())
    }

    /// Deliver the next queued reply, reading from the socket when the queue
    /// is empty. The whole wait is bounded by the reply timeout; on elapse
    /// the channel is destroyed, since a stray late reply would desynchronise
    /// every later command.
    pub(crate) fn recv_reply(&mut self) -> FtpResult<Reply> {
        if let Some(reply) = self.queue.pop_front() {
            trace!("S: {reply}");
            return Ok(reply);
        }
        if self.destroyed {
            return Err(FtpError::not_connected());
        }
        let deadline = Instant::now() + self.reply_timeout;
        let mut buf = [0u8; 4096];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                self.fail();
                return Err(FtpError::Timeout("waiting for server reply"));
            }
            if let Err(e) = self.stream.set_read_timeout(Some(remaining)) {
                self.fail();
                return Err(FtpError::Network(e));
            }
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    self.fail();
                    return Err(FtpError::Network(
                        std::io::ErrorKind::UnexpectedEof.into(),
                    ));
                }
                Ok(n) => {
                    self.queue.extend(self.parser.feed(&buf[..n]));
                    if let Some(reply) = self.queue.pop_front() {
                        trace!("S: {reply}");
                        return Ok(reply);
                    }
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    self.fail();
                    return Err(FtpError::Timeout("waiting for server reply"));
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.fail();
                    return Err(FtpError::Network(e));
                }
            }
        }
    }

    /// Remote endpoint of the control connection; passive data connections
    /// go to this host.
    pub(crate) fn peer_addr(&self) -> FtpResult<SocketAddr> {
        self.stream.peer_addr().map_err(FtpError::Network)
    }

    pub(crate) fn is_open(&self) -> bool {
        !self.destroyed
    }

    /// Idempotent; called after QUIT or on fatal errors.
    pub(crate) fn close(&mut self) {
        if !self.destroyed {
            debug!("closing control connection");
            self.destroyed = true;
            let _ = self.stream.shutdown(Shutdown::Both);
        }
    }

    fn fail(&mut self) {
        self.destroyed = true;
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl Drop for ControlChannel {
    fn drop(&mut self) {
        self.close();
    }
}
