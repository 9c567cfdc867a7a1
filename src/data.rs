//! # Data channel
//!
//! A short-lived TCP connection carrying one transfer or listing payload.
//! Every operation consumes the channel, so the socket is released on every
//! exit path; dropping the channel is what signals end-of-transfer to the
//! server on uploads.

use std::fs::File;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::time::Duration;

use crate::types::{FtpError, FtpResult};

const CHUNK_SIZE: usize = 32 * 1024;

pub(crate) struct DataChannel {
    stream: TcpStream,
}

impl DataChannel {
    pub(crate) fn connect(
        addr: SocketAddr,
        dial_timeout: Duration,
        idle_timeout: Duration,
    ) -> FtpResult<Self> {
        debug!("opening data connection to {addr}");
        let stream = TcpStream::connect_timeout(&addr, dial_timeout)
            .map_err(|e| FtpError::from_io(e, "dialing data connection"))?;
        stream
            .set_read_timeout(Some(idle_timeout))
            .and_then(|_| stream.set_write_timeout(Some(idle_timeout)))
            .map_err(FtpError::Network)?;
        Ok(Self { stream })
    }

    /// Pipe all inbound bytes into a newly created file at `path`, invoking
    /// `on_chunk` with the size of each chunk written. Completes at peer EOF
    /// and returns the byte total.
    pub(crate) fn download_to<F>(mut self, path: &Path, mut on_chunk: F) -> FtpResult<u64>
    where
        F: FnMut(u64),
    {
        let mut file = File::create(path).map_err(FtpError::Network)?;
        let mut buf = [0u8; CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    file.write_all(&buf[..n]).map_err(FtpError::Network)?;
                    total += n as u64;
                    on_chunk(n as u64);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FtpError::from_io(e, "receiving data")),
            }
        }
        file.flush().map_err(FtpError::Network)?;
        debug!("downloaded {total} bytes to {}", path.display());
        Ok(total)
    }

    /// Stream the file at `path` to the socket, invoking `on_progress` with
    /// the running byte total after each chunk. Closing the socket at file
    /// EOF tells the server the transfer is complete.
    pub(crate) fn upload_from<F>(mut self, path: &Path, mut on_progress: F) -> FtpResult<u64>
    where
        F: FnMut(u64),
    {
        let mut file = File::open(path).map_err(FtpError::Network)?;
        let mut buf = [0u8; CHUNK_SIZE];
        let mut sent = 0u64;
        loop {
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FtpError::Network(e)),
            };
            self.stream
                .write_all(&buf[..n])
                .map_err(|e| FtpError::from_io(e, "sending data"))?;
            sent += n as u64;
            on_progress(sent);
        }
        debug!("uploaded {sent} bytes from {}", path.display());
        Ok(sent)
    }

    /// Collect all inbound bytes until peer EOF; used for directory
    /// listings.
    pub(crate) fn read_to_end(mut self) -> FtpResult<Vec<u8>> {
        let mut payload = Vec::new();
        self.stream
            .read_to_end(&mut payload)
            .map_err(|e| FtpError::from_io(e, "receiving listing"))?;
        Ok(payload)
    }
}

#[cfg(test)]
mod test {

    use std::net::TcpListener;
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    fn tempfile(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ftpwire-data-{}-{name}", std::process::id()))
    }

    fn serve_bytes(payload: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(payload).unwrap();
        });
        addr
    }

    #[test]
    fn read_to_end_collects_payload() {
        crate::log_init();
        let addr = serve_bytes(b"type=file;size=1; a.txt\r\n");
        let channel =
            DataChannel::connect(addr, Duration::from_secs(5), Duration::from_secs(5)).unwrap();
        let payload = channel.read_to_end().unwrap();
        assert_eq!(payload, b"type=file;size=1; a.txt\r\n".to_vec());
    }

    #[test]
    fn download_reports_chunks() {
        crate::log_init();
        let addr = serve_bytes(b"hello, world!");
        let channel =
            DataChannel::connect(addr, Duration::from_secs(5), Duration::from_secs(5)).unwrap();
        let path = tempfile("download");
        let mut reported = 0u64;
        let total = channel.download_to(&path, |chunk| reported += chunk).unwrap();
        assert_eq!(total, 13);
        assert_eq!(reported, 13);
        assert_eq!(std::fs::read(&path).unwrap(), b"hello, world!".to_vec());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn upload_streams_file_and_closes() {
        crate::log_init();
        let path = tempfile("upload");
        std::fs::write(&path, b"payload bytes").unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).unwrap();
            received
        });

        let channel =
            DataChannel::connect(addr, Duration::from_secs(5), Duration::from_secs(5)).unwrap();
        let mut last_progress = 0u64;
        let sent = channel
            .upload_from(&path, |so_far| last_progress = so_far)
            .unwrap();
        assert_eq!(sent, 13);
        assert_eq!(last_progress, 13);
        assert_eq!(server.join().unwrap(), b"payload bytes".to_vec());
        let _ = std::fs::remove_file(&path);
    }
}
