//! Room configuration and state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Time allowed per question. Announced to clients in whole seconds.
    pub time_limit: Duration,

    /// The synthetic participant added to each new room, if any.
    pub bot: Option<BotConfig>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(10),
            bot: Some(BotConfig::default()),
        }
    }
}

impl RoomConfig {
    /// A config without a synthetic participant.
    pub fn without_bot() -> Self {
        Self {
            bot: None,
            ..Default::default()
        }
    }

    /// The per-question time limit in whole seconds, rounded up, never 0.
    pub fn time_limit_secs(&self) -> u32 {
        let mut secs = self.time_limit.as_secs();
        if self.time_limit.subsec_nanos() > 0 {
            secs += 1;
        }
        u32::try_from(secs).unwrap_or(u32::MAX).max(1)
    }
}

// ---------------------------------------------------------------------------
// BotConfig
// ---------------------------------------------------------------------------

/// Behaviour of the synthetic participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Display name, unique within the room like any other name.
    pub name: String,

    /// Probability in `0.0..=1.0` of answering correctly.
    pub accuracy: f64,

    /// Shortest delay before answering.
    pub min_delay: Duration,

    /// Longest delay before answering. Always kept below the question's
    /// time limit.
    pub max_delay: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "Computer".to_string(),
            accuracy: 0.8,
            min_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl BotConfig {
    /// Clamp out-of-range values.
    ///
    /// - `accuracy` clamped to `0.0..=1.0` (NaN falls back to the default).
    /// - `max_delay` raised to `min_delay` if it is smaller.
    pub fn validated(mut self) -> Self {
        if self.accuracy.is_nan() {
            warn!("bot accuracy is NaN, using default");
            self.accuracy = Self::default().accuracy;
        }
        if !(0.0..=1.0).contains(&self.accuracy) {
            warn!(accuracy = self.accuracy, "bot accuracy out of range, clamping");
            self.accuracy = self.accuracy.clamp(0.0, 1.0);
        }
        if self.max_delay < self.min_delay {
            warn!(
                min = ?self.min_delay,
                max = ?self.max_delay,
                "bot max_delay below min_delay, raising"
            );
            self.max_delay = self.min_delay;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Eviction policy for the room registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// How long an ended room stays registered so players can read the
    /// final scores.
    pub ended_room_ttl: Duration,

    /// How often the server sweeps the registry for rooms to evict.
    pub sweep_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ended_room_ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions are strictly ordered:
///
/// ```text
/// Lobby → Active → Ended
/// ```
///
/// - **Lobby**: Room exists, players gather. Only the host can start.
/// - **Active**: Questions are being asked and answers scored.
/// - **Ended**: Final scores were broadcast. The room lingers until the
///   registry evicts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Lobby,
    Active,
    Ended,
}

impl RoomState {
    /// Returns `true` while answers are accepted.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns the following state, or `None` from `Ended`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::Active),
            Self::Active => Some(Self::Ended),
            Self::Ended => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "LOBBY"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Ended => write!(f, "ENDED"),
        }
    }
}
