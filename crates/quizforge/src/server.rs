//! `QuizServer` builder and server loop.
//!
//! This is the entry point for running a Quizforge server. It ties
//! together all the layers: transport → protocol → room.

use std::net::SocketAddr;
use std::sync::Arc;

use quizforge_room::{QuestionBank, RegistryConfig, RoomConfig, RoomRegistry};
use quizforge_transport::{LineTransport, Transport};
use tokio::sync::Mutex;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::QuizforgeError;
use crate::handler::handle_connection;

/// Address the server listens on unless told otherwise.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:50000";

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The registry
/// sits behind one `Mutex`: allocating a room code and registering the
/// room is a single critical section.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
}

/// Builder for configuring and starting a Quizforge server.
///
/// # Example
///
/// ```rust,ignore
/// let server = QuizServer::builder()
///     .bind("127.0.0.1:0")
///     .room_config(RoomConfig::without_bot())
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct QuizServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    registry_config: RegistryConfig,
    questions: Option<QuestionBank>,
}

impl QuizServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            room_config: RoomConfig::default(),
            registry_config: RegistryConfig::default(),
            questions: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every new room gets.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the room eviction policy.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Sets the questions every room asks. Defaults to
    /// [`QuestionBank::builtin`].
    pub fn question_bank(mut self, questions: QuestionBank) -> Self {
        self.questions = Some(questions);
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Fails if the address cannot be bound.
    pub async fn build(self) -> Result<QuizServer, QuizforgeError> {
        let transport = LineTransport::bind(&self.bind_addr).await?;
        let questions = self.questions.unwrap_or_else(QuestionBank::builtin);
        info!(
            addr = %self.bind_addr,
            questions = questions.len(),
            bot = self.room_config.bot.is_some(),
            "server bound"
        );

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(self.room_config, questions)),
        });

        Ok(QuizServer {
            transport,
            state,
            registry_config: self.registry_config,
        })
    }
}

impl Default for QuizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Quizforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizServer {
    transport: LineTransport,
    state: Arc<ServerState>,
    registry_config: RegistryConfig,
}

impl QuizServer {
    /// Creates a new builder.
    pub fn builder() -> QuizServerBuilder {
        QuizServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, QuizforgeError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// A failed accept is logged and the loop carries on. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), QuizforgeError> {
        let addr = self.local_addr()?;
        info!(%addr, "Quizforge server listening");

        tokio::spawn(sweep_rooms(
            Arc::clone(&self.state),
            self.registry_config.clone(),
        ));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Periodically evicts ended and abandoned rooms.
async fn sweep_rooms(state: Arc<ServerState>, config: RegistryConfig) {
    if config.sweep_interval.is_zero() {
        info!("room sweeping disabled");
        return;
    }

    let mut interval = time::interval(config.sweep_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; nothing to sweep yet.
    interval.tick().await;

    loop {
        interval.tick().await;
        let evicted = state
            .registry
            .lock()
            .await
            .evict_idle(Instant::now(), config.ended_room_ttl)
            .await;
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "sweep evicted rooms");
        }
    }
}
