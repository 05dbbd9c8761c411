//! FIFO of accepted connections waiting for a free worker.
//!
//! Backed by an unbounded channel. The acceptor holds the only
//! [`RequestSender`]; dropping it closes the queue, which is what wakes every
//! idle worker at shutdown.

use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::net::TcpStream;

/// An accepted socket nobody has served yet.
#[derive(Debug)]
pub struct PendingConnection {
    pub stream: TcpStream,
    /// Arrival order, for logging.
    pub id: u64,
}

pub fn request_queue() -> (RequestSender, RequestReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        RequestSender { tx, next_id: 1 },
        RequestReceiver { rx },
    )
}

pub struct RequestSender {
    tx: Sender<PendingConnection>,
    next_id: u64,
}

impl RequestSender {
    /// Appends to the tail and wakes one waiting worker. Returns the
    /// connection back if every worker has already gone.
    pub fn enqueue(&mut self, stream: TcpStream) -> Result<u64, TcpStream> {
        let id = self.next_id;
        self.next_id += 1;
        match self.tx.send(PendingConnection { stream, id }) {
            Ok(()) => {
                debug!("Queued connection {} ({} waiting)", id, self.tx.len());
                Ok(id)
            }
            Err(e) => Err(e.into_inner().stream),
        }
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }
}

#[derive(Clone)]
pub struct RequestReceiver {
    rx: Receiver<PendingConnection>,
}

impl RequestReceiver {
    /// Blocks until a connection is queued. `None` once the sender is gone
    /// and the queue has drained.
    pub fn dequeue(&self) -> Option<PendingConnection> {
        self.rx.recv().ok()
    }

    pub fn try_dequeue(&self) -> Option<PendingConnection> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
