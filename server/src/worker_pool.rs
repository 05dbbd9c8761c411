//! Fixed set of worker threads draining the request queue.
//!
//! Each worker serves one session to completion before taking the next
//! connection, so the pool size caps concurrent sessions. Connections that
//! are still queued once shutdown has begun are closed without being served.

use crate::error::ServerError;
use crate::poll_io::Connection;
use crate::queue::{PendingConnection, RequestReceiver};
use crate::session::{SessionContext, SessionHandler};
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        size: usize,
        queue: RequestReceiver,
        ctx: Arc<SessionContext>,
    ) -> Result<Self, ServerError> {
        let mut handles = Vec::with_capacity(size);
        for id in 0..size {
            let queue = queue.clone();
            let ctx = Arc::clone(&ctx);
            let handle = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, queue, ctx))
                .map_err(ServerError::Spawn)?;
            handles.push(handle);
        }
        info!("Started {} worker threads", size);
        Ok(Self { handles })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker. Only returns once the queue has been closed.
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                warn!("A worker thread panicked");
            }
        }
    }
}

fn worker_loop(id: usize, queue: RequestReceiver, ctx: Arc<SessionContext>) {
    debug!("Worker {}: waiting for request", id);
    while let Some(pending) = queue.dequeue() {
        if ctx.shutdown.is_triggered() {
            debug!("Worker {}: dropping queued connection {}", id, pending.id);
            continue;
        }
        serve(id, pending, &ctx);
        debug!("Worker {}: waiting for request", id);
    }
    info!("Worker {}: exiting", id);
}

fn serve(id: usize, pending: PendingConnection, ctx: &SessionContext) {
    info!("Worker {}: handling connection {}", id, pending.id);
    match Connection::new(pending.stream, ctx.shutdown.clone(), ctx.poll_interval) {
        Ok(conn) => {
            SessionHandler::new(conn, ctx, id).run();
        }
        Err(e) => warn!("Worker {}: cannot configure connection {}: {}", id, pending.id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialStore;
    use crate::game::RandomBoards;
    use crate::queue::request_queue;
    use crate::shutdown::Shutdown;
    use shared::CONNECTED;
    use std::io::Read;
    use std::net::{TcpListener, TcpStream};
    use std::time::Duration;

    fn context(shutdown: &Shutdown) -> Arc<SessionContext> {
        Arc::new(SessionContext::new(
            CredentialStore::from_accounts([("alice", "secret")]),
            Box::new(RandomBoards::new(Some(1))),
            shutdown.clone(),
            Duration::from_millis(10),
        ))
    }

    fn connect(listener: &TcpListener) -> (TcpStream, TcpStream) {
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        (client, server_side)
    }

    #[test]
    fn test_pool_serves_queued_connection() {
        let shutdown = Shutdown::new();
        let (mut tx, rx) = request_queue();
        let pool = WorkerPool::spawn(2, rx, context(&shutdown)).unwrap();
        assert_eq!(pool.size(), 2);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let (mut client, server_side) = connect(&listener);
        tx.enqueue(server_side).unwrap();

        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(i32::from_le_bytes(buf), CONNECTED);

        shutdown.trigger();
        drop(tx);
        pool.join();
    }

    #[test]
    fn test_idle_workers_exit_when_queue_closes() {
        let shutdown = Shutdown::new();
        let (tx, rx) = request_queue();
        let pool = WorkerPool::spawn(3, rx, context(&shutdown)).unwrap();

        shutdown.trigger();
        drop(tx);
        pool.join();
    }

    #[test]
    fn test_queued_connections_closed_on_shutdown() {
        let shutdown = Shutdown::new();
        let (mut tx, rx) = request_queue();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let (mut client, server_side) = connect(&listener);

        shutdown.trigger();
        tx.enqueue(server_side).unwrap();
        drop(tx);

        let pool = WorkerPool::spawn(1, rx, context(&shutdown)).unwrap();
        pool.join();

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).unwrap();
        assert!(rest.is_empty());
    }
}
