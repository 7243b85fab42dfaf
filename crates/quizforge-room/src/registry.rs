//! Room registry: allocates room codes and tracks every live room.

use std::collections::HashMap;
use std::time::Duration;

use quizforge_protocol::RoomCode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::room::spawn_room;
use crate::{MessageSink, QuestionBank, RoomConfig, RoomError, RoomHandle, RoomState};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Draws random codes until one is not `taken`.
///
/// With 36^4 possible codes the loop ends quickly for any realistic number
/// of live rooms.
pub(crate) fn generate_code<R: Rng>(rng: &mut R, taken: impl Fn(&RoomCode) -> bool) -> RoomCode {
    loop {
        let code = RoomCode::random(rng);
        if !taken(&code) {
            return code;
        }
    }
}

/// Tracks all live rooms by code.
///
/// This is the entry point for room creation and lookup from the server.
/// Every method takes `&mut self` or `&self` and the server keeps the
/// registry behind one `tokio::sync::Mutex`, so generating a code and
/// registering it happen in one critical section.
pub struct RoomRegistry {
    /// Live rooms, keyed by code.
    rooms: HashMap<RoomCode, RoomHandle>,
    rng: StdRng,
    room_config: RoomConfig,
    questions: QuestionBank,
}

impl RoomRegistry {
    /// Creates an empty registry whose rooms use `room_config` and ask
    /// questions from `questions`.
    pub fn new(room_config: RoomConfig, questions: QuestionBank) -> Self {
        Self::with_rng(room_config, questions, StdRng::from_os_rng())
    }

    /// Like [`new`](Self::new) but with a caller-provided random source,
    /// so tests can make code generation deterministic.
    pub fn with_rng(room_config: RoomConfig, questions: QuestionBank, rng: StdRng) -> Self {
        Self {
            rooms: HashMap::new(),
            rng,
            room_config,
            questions,
        }
    }

    /// Creates a room and joins `host_name` as its first participant.
    ///
    /// The room greets the host with `ROOM_CODE:<code>` through `sink`.
    pub async fn create_room(
        &mut self,
        host_name: &str,
        sink: Box<dyn MessageSink>,
    ) -> Result<RoomHandle, RoomError> {
        let rooms = &self.rooms;
        let code = generate_code(&mut self.rng, |c| rooms.contains_key(c));
        let handle = spawn_room(
            code.clone(),
            self.room_config.clone(),
            &self.questions,
            DEFAULT_CHANNEL_SIZE,
        );

        if let Err(e) = handle.join(host_name, sink).await {
            let _ = handle.shutdown().await;
            return Err(e);
        }

        self.rooms.insert(code.clone(), handle.clone());
        info!(room = %code, host = %host_name, rooms = self.rooms.len(), "room created");
        Ok(handle)
    }

    /// Joins `name` to the room registered under `code`.
    ///
    /// Unknown codes fail with [`RoomError::NotFound`] and change nothing.
    /// Rooms accept joins in any state.
    pub async fn join_room(
        &self,
        code: &RoomCode,
        name: &str,
        sink: Box<dyn MessageSink>,
    ) -> Result<RoomHandle, RoomError> {
        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        handle.join(name, sink).await?;
        Ok(handle.clone())
    }

    /// Returns the handle of the room registered under `code`.
    pub fn room(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(code).cloned()
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all live room codes, sorted.
    pub fn room_codes(&self) -> Vec<RoomCode> {
        let mut codes: Vec<RoomCode> = self.rooms.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Unregisters a room and shuts its actor down.
    pub async fn destroy_room(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        // The actor may already be gone; there is nothing left to stop then.
        let _ = handle.shutdown().await;

        info!(room = %code, "room destroyed");
        Ok(())
    }

    /// Removes rooms nobody needs any more and returns their codes.
    ///
    /// A room is evicted when its actor has stopped, when it has no
    /// networked participant left, or when it ended at least
    /// `ended_room_ttl` before `now`.
    pub async fn evict_idle(&mut self, now: Instant, ended_room_ttl: Duration) -> Vec<RoomCode> {
        let mut doomed = Vec::new();
        for (code, handle) in &self.rooms {
            let reason = match handle.info().await {
                Err(_) => Some("actor stopped"),
                Ok(info) if info.networked_count == 0 => Some("abandoned"),
                Ok(info) if info.state == RoomState::Ended => info
                    .ended_at
                    .filter(|ended| now.saturating_duration_since(*ended) >= ended_room_ttl)
                    .map(|_| "ended"),
                Ok(_) => None,
            };
            if let Some(reason) = reason {
                debug!(room = %code, reason, "room marked for eviction");
                doomed.push(code.clone());
            }
        }

        for code in &doomed {
            if let Err(e) = self.destroy_room(code).await {
                warn!(room = %code, error = %e, "eviction failed");
            }
        }
        if !doomed.is_empty() {
            info!(evicted = doomed.len(), remaining = self.rooms.len(), "idle rooms evicted");
        }
        doomed
    }
}
