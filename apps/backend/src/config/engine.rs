//! Engine timing knobs, read from environment variables with compiled
//! defaults.

use std::env;
use std::time::Duration;

/// All timers the room layer arms. Values are wall-clock durations; the
/// domain layer never reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long a seat may think on its turn (betting and playing).
    pub turn_timeout: Duration,
    /// How long the chooser may take over a trump decision.
    pub trump_selection_timeout: Duration,
    /// Observation window after the fourth card before the trick is swept.
    pub trick_recap_timeout: Duration,
    /// Recap window between pulkas.
    pub pulka_recap_timeout: Duration,
    /// Grace window before a disconnected human becomes a bot.
    pub reconnect_timeout: Duration,
    /// How long a lone queued player waits before bots fill the room.
    pub matchmaking_timeout: Duration,
    /// Artificial thinking delay before a bot acts.
    pub bot_turn_delay: Duration,
    /// Per-card animation budget for the tuzovanie recap.
    pub tuzovanie_card_delay: Duration,
    pub bind_addr: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_millis(30_000),
            trump_selection_timeout: Duration::from_millis(30_000),
            trick_recap_timeout: Duration::from_millis(2_000),
            pulka_recap_timeout: Duration::from_millis(10_000),
            reconnect_timeout: Duration::from_millis(30_000),
            matchmaking_timeout: Duration::from_millis(60_000),
            bot_turn_delay: Duration::from_millis(1_000),
            tuzovanie_card_delay: Duration::from_millis(600),
            bind_addr: "0.0.0.0:3001".to_string(),
        }
    }
}

impl EngineConfig {
    /// Read overrides from the environment; unset or malformed variables
    /// fall back to the compiled defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            turn_timeout: env_ms("TURN_TIMEOUT_MS", defaults.turn_timeout),
            trump_selection_timeout: env_ms(
                "TRUMP_SELECTION_TIMEOUT_MS",
                defaults.trump_selection_timeout,
            ),
            trick_recap_timeout: env_ms("TRICK_RECAP_TIMEOUT_MS", defaults.trick_recap_timeout),
            pulka_recap_timeout: env_ms("PULKA_RECAP_TIMEOUT_MS", defaults.pulka_recap_timeout),
            reconnect_timeout: env_ms("RECONNECT_TIMEOUT_MS", defaults.reconnect_timeout),
            matchmaking_timeout: env_ms("MATCHMAKING_TIMEOUT_MS", defaults.matchmaking_timeout),
            bot_turn_delay: env_ms("BOT_TURN_DELAY_MS", defaults.bot_turn_delay),
            tuzovanie_card_delay: env_ms("TUZOVANIE_CARD_DELAY_MS", defaults.tuzovanie_card_delay),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }
}

fn env_ms(var: &str, default: Duration) -> Duration {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
