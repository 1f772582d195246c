use std::env;
use std::str::FromStr;

use chrono::Weekday;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            telegram: TelegramConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  telegram:   token={}, api_base={}",
            if self.telegram.bot_token.is_some() { "set" } else { "unset" },
            self.telegram.api_base,
        );
        tracing::info!(
            "  scheduler:  tick={}s, announce_hour={}, handoff={} {}:00",
            self.scheduler.tick_secs,
            self.scheduler.announce_hour,
            self.scheduler.handoff_weekday,
            self.scheduler.handoff_hour,
        );
    }
}

// ── Telegram ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token; the bot cannot run without it.
    pub bot_token: Option<String>,
    /// Bot API base URL, overridable for tests and proxies.
    pub api_base: String,
    /// Long-polling timeout passed to `getUpdates`, in seconds.
    pub poll_timeout_secs: u64,
}

impl TelegramConfig {
    fn from_env() -> Self {
        Self {
            bot_token: env_opt("BOT_TOKEN"),
            api_base: env_or("TELEGRAM_API_BASE", "https://api.telegram.org"),
            poll_timeout_secs: env_u64("TELEGRAM_POLL_TIMEOUT_SECS", 30),
        }
    }
}

// ── Scheduler cadence ─────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between scheduler ticks, in seconds.
    pub tick_secs: u64,
    /// Local hour at which vacation start/end announcements fire.
    pub announce_hour: u32,
    /// Weekday of the weekly duty hand-off.
    pub handoff_weekday: Weekday,
    /// Local hour of the weekly duty hand-off.
    pub handoff_hour: u32,
}

impl SchedulerConfig {
    fn from_env() -> Self {
        let handoff_weekday = env_opt("SCHED_HANDOFF_WEEKDAY")
            .and_then(|v| Weekday::from_str(&v).ok())
            .unwrap_or(Weekday::Mon);
        Self {
            tick_secs: env_u64("SCHED_TICK_SECS", 60),
            announce_hour: env_u32("SCHED_ANNOUNCE_HOUR", 10),
            handoff_weekday,
            handoff_hour: env_u32("SCHED_HANDOFF_HOUR", 12),
        }
    }
}
