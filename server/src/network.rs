//! Listening socket, accept loop and server lifecycle.
//!
//! The acceptor runs on the calling thread. It polls the non-blocking
//! listener, sleeping one poll interval whenever nothing is pending, so it
//! notices shutdown promptly. Once the flag is set it stops accepting, closes
//! the request queue to release idle workers, and joins the pool.

use crate::config::ServerConfig;
use crate::credentials::CredentialStore;
use crate::error::ServerError;
use crate::game::GameEngine;
use crate::queue::{request_queue, RequestSender};
use crate::session::SessionContext;
use crate::shutdown::Shutdown;
use crate::worker_pool::WorkerPool;
use log::{debug, info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;

const BACKLOG: i32 = 128;

/// Binds a non-blocking listener with `SO_REUSEADDR`.
pub fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;
    Ok(socket.into())
}

pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    ctx: Arc<SessionContext>,
}

impl Server {
    pub fn bind(
        config: ServerConfig,
        credentials: CredentialStore,
        engine: Box<dyn GameEngine>,
        shutdown: Shutdown,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        let addr = config.socket_addr()?;
        let listener = create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;
        info!("Server listening on {}", listener.local_addr().unwrap_or(addr));

        let ctx = Arc::new(SessionContext::new(
            credentials,
            engine,
            shutdown,
            config.poll_interval,
        ));
        Ok(Self {
            listener,
            config,
            ctx,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared state, mainly so callers can inspect the leaderboard.
    pub fn context(&self) -> Arc<SessionContext> {
        Arc::clone(&self.ctx)
    }

    /// Serves until the shutdown flag is set, then waits for every worker.
    pub fn run(self) -> Result<(), ServerError> {
        let (mut sender, receiver) = request_queue();
        let pool = WorkerPool::spawn(self.config.workers, receiver, Arc::clone(&self.ctx))?;

        self.accept_loop(&mut sender);

        info!(
            "Shutting down: no longer accepting, {} connections left unserved",
            sender.len()
        );
        drop(sender);
        pool.join();
        info!(
            "All workers stopped; releasing {} leaderboard entries",
            self.ctx.leaderboard.len()
        );
        Ok(())
    }

    fn accept_loop(&self, sender: &mut RequestSender) {
        let shutdown = &self.ctx.shutdown;
        while !shutdown.is_triggered() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    info!("Accepted connection from {}", addr);
                    if let Err(stream) = sender.enqueue(stream) {
                        warn!("No workers left, dropping {:?}", stream.peer_addr());
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(self.config.poll_interval);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!("accept failed: {}", e);
                    thread::sleep(self.config.poll_interval);
                }
            }
        }
    }
}
