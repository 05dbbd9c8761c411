//! Shutdown-aware, fixed-length socket I/O.
//!
//! Every protocol step goes through [`Connection`]. Reads and writes wait on
//! the socket for at most one poll interval at a time, then re-check the
//! shutdown flag and the connection's liveness, so no session can hold a
//! worker past a shutdown or a disconnect.

use crate::shutdown::Shutdown;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::INT_SIZE;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown as SocketShutdown, SocketAddr, TcpStream};
use std::time::Duration;
use thiserror::Error;

/// Why a session stopped talking to its peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Disconnect {
    #[error("connection closed by peer")]
    Closed,
    #[error("aborted by server shutdown")]
    Aborted,
}

pub type IoResult<T> = Result<T, Disconnect>;

pub struct Connection {
    stream: TcpStream,
    peer: Option<SocketAddr>,
    alive: bool,
    shutdown: Shutdown,
}

impl Connection {
    pub fn new(stream: TcpStream, shutdown: Shutdown, poll_interval: Duration) -> io::Result<Self> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(poll_interval))?;
        stream.set_write_timeout(Some(poll_interval))?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr().ok();
        Ok(Self {
            stream,
            peer,
            alive: true,
            shutdown,
        })
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Checked before every wait: shutdown wins over a dead socket.
    fn ensure_usable(&self) -> IoResult<()> {
        if self.shutdown.is_triggered() {
            return Err(Disconnect::Aborted);
        }
        if !self.alive {
            return Err(Disconnect::Closed);
        }
        Ok(())
    }

    fn mark_closed(&mut self, reason: &dyn std::fmt::Display) {
        debug!("Connection {:?} lost: {}", self.peer, reason);
        self.alive = false;
    }

    /// Reads exactly `len` bytes.
    pub fn read_exact(&mut self, len: usize) -> IoResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;

        while filled < len {
            self.ensure_usable()?;
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => self.mark_closed(&"end of stream"),
                Ok(n) => filled += n,
                Err(e) if is_retryable(&e) => continue,
                Err(e) => self.mark_closed(&e),
            }
        }

        Ok(buf)
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> IoResult<()> {
        let mut written = 0;

        while written < bytes.len() {
            self.ensure_usable()?;
            match self.stream.write(&bytes[written..]) {
                Ok(0) => self.mark_closed(&"write returned zero"),
                Ok(n) => written += n,
                Err(e) if is_retryable(&e) => continue,
                Err(e) => self.mark_closed(&e),
            }
        }

        Ok(())
    }

    pub fn read_byte(&mut self) -> IoResult<u8> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn read_int(&mut self) -> IoResult<i32> {
        self.read_record(INT_SIZE)
    }

    /// Reads a fixed-width record of `len` bytes and decodes it.
    pub fn read_record<T: DeserializeOwned>(&mut self, len: usize) -> IoResult<T> {
        let bytes = self.read_exact(len)?;
        shared::decode(&bytes).map_err(|e| {
            self.mark_closed(&e);
            Disconnect::Closed
        })
    }

    pub fn send_int(&mut self, value: i32) -> IoResult<()> {
        self.send_record(&value)
    }

    pub fn send_long(&mut self, value: i64) -> IoResult<()> {
        self.send_record(&value)
    }

    pub fn send_record<T: Serialize>(&mut self, value: &T) -> IoResult<()> {
        let bytes = shared::encode(value).map_err(|e| {
            self.mark_closed(&e);
            Disconnect::Closed
        })?;
        self.write_all(&bytes)
    }

    /// Closes both halves of the socket.
    pub fn close(mut self) {
        self.alive = false;
        let _ = self.stream.shutdown(SocketShutdown::Both);
    }
}

fn is_retryable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    const POLL: Duration = Duration::from_millis(20);

    fn pair(shutdown: &Shutdown) -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let peer = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (stream, _) = listener.accept().unwrap();
        (Connection::new(stream, shutdown.clone(), POLL).unwrap(), peer)
    }

    #[test]
    fn test_reads_exact_length() {
        let shutdown = Shutdown::new();
        let (mut conn, mut peer) = pair(&shutdown);
        peer.write_all(&[7, 0, 0, 0, 9]).unwrap();

        assert_eq!(conn.read_int(), Ok(7));
        assert_eq!(conn.read_byte(), Ok(9));
    }

    #[test]
    fn test_assembles_split_writes() {
        let shutdown = Shutdown::new();
        let (mut conn, mut peer) = pair(&shutdown);

        let writer = thread::spawn(move || {
            peer.write_all(&[1, 2]).unwrap();
            thread::sleep(Duration::from_millis(50));
            peer.write_all(&[3, 4]).unwrap();
            peer
        });

        assert_eq!(conn.read_exact(4), Ok(vec![1, 2, 3, 4]));
        writer.join().unwrap();
    }

    #[test]
    fn test_peer_close_reports_closed() {
        let shutdown = Shutdown::new();
        let (mut conn, peer) = pair(&shutdown);
        drop(peer);

        assert_eq!(conn.read_int(), Err(Disconnect::Closed));
        assert!(!conn.is_alive());
        assert_eq!(conn.read_byte(), Err(Disconnect::Closed));
    }

    #[test]
    fn test_shutdown_aborts_pending_read() {
        let shutdown = Shutdown::new();
        let (mut conn, _peer) = pair(&shutdown);

        let trigger = shutdown.clone();
        let started = Instant::now();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            trigger.trigger();
        });

        assert_eq!(conn.read_int(), Err(Disconnect::Aborted));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_no_writes_after_shutdown() {
        let shutdown = Shutdown::new();
        let (mut conn, mut peer) = pair(&shutdown);
        shutdown.trigger();

        assert_eq!(conn.send_int(1), Err(Disconnect::Aborted));

        conn.close();
        let mut buf = Vec::new();
        peer.read_to_end(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_send_encodes_little_endian() {
        let shutdown = Shutdown::new();
        let (mut conn, mut peer) = pair(&shutdown);
        conn.send_int(shared::AUTH_SUCCESS).unwrap();
        conn.send_long(300).unwrap();

        let mut buf = [0u8; 12];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 0, 0, 0, 44, 1, 0, 0, 0, 0, 0, 0]);
    }
}
