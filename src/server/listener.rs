use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Semaphore, mpsc};

use crate::client::{Session, SessionConfig, Termination};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::middleware::ServerLogger;
use crate::protocol::{Reply, ReplyCode};

/// Accepts control connections and spawns one `Session` task per connection.
///
/// Sessions share only the `SessionConfig` (and through it the driver).
pub struct Listener {
    listener: TcpListener,
    sessions: Arc<SessionConfig>,
    logger: ServerLogger,
    max_clients: usize,
    slots: Arc<Semaphore>,
    next_session_id: AtomicU64,
    terminations: Option<mpsc::UnboundedSender<Termination>>,
}

impl Listener {
    pub async fn bind(
        config: &ServerConfig,
        sessions: SessionConfig,
        logger: ServerLogger,
    ) -> Result<Self, ServerError> {
        let addr = config.control_socket();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        logger.info(format_args!("Server bound to {}", listener.local_addr()?));

        Ok(Self {
            listener,
            sessions: Arc::new(sessions),
            logger,
            max_clients: config.max_clients,
            slots: Arc::new(Semaphore::new(config.max_clients)),
            next_session_id: AtomicU64::new(1),
            terminations: None,
        })
    }

    /// Forward every session's `Termination` to `tx`.
    pub fn notify_terminations(mut self, tx: mpsc::UnboundedSender<Termination>) -> Self {
        self.terminations = Some(tx);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` completes.
    ///
    /// Sessions already running are left to finish on their own.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        self.logger.info(format_args!(
            "Starting Rax FTP server on {} (max {} clients)",
            self.local_addr()?,
            self.max_clients
        ));

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    self.logger.info(format_args!("Shutdown requested, no longer accepting connections"));
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_session(stream, peer),
                    Err(e) => {
                        self.logger.error(format_args!("Error accepting connection: {}", e));
                    }
                },
            }
        }
    }

    fn spawn_session(&self, stream: TcpStream, peer: SocketAddr) {
        let permit = match Arc::clone(&self.slots).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                self.logger.warn(format_args!(
                    "Refusing {}: {} clients already connected",
                    peer, self.max_clients
                ));
                tokio::spawn(refuse(stream, self.logger.clone()));
                return;
            }
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let log = self.logger.for_connection(session_id, peer);
        let session = Session::new(stream, Arc::clone(&self.sessions), log);
        let terminations = self.terminations.clone();

        // Spawn a task for each client so accept loop doesn't block
        tokio::spawn(async move {
            let termination = session.serve().await;
            drop(permit);
            if let Some(tx) = terminations {
                let _ = tx.send(termination);
            }
        });
    }
}

async fn refuse(mut stream: TcpStream, logger: ServerLogger) {
    let reply = Reply::new(
        ReplyCode::ServiceUnavailable,
        "Too many connections. Try again later.",
    );
    if let Err(e) = stream.write_all(reply.encode().as_bytes()).await {
        logger.debug(format_args!("Failed to send refusal: {}", e));
    }
    if let Err(e) = stream.shutdown().await {
        logger.debug(format_args!("Refused connection shutdown failed: {}", e));
    }
}
