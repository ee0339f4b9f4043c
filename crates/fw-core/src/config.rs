use std::{env, fs, path::Path, time::Duration};

use crate::{domain::ChatId, domain::WatchSet, errors::Error, Result};

pub const DEFAULT_WHAZZUP_URL: &str = "https://api.ivao.aero/v2/tracker/whazzup";
const DEFAULT_WATCH_AIRPORTS: &str = "OJAI,ORBI,OJAM";

/// Typed configuration, fixed at process start.
#[derive(Clone, Debug)]
pub struct Config {
    // Chat
    pub telegram_bot_token: String,
    pub channel_id: ChatId,
    pub telegram_safe_limit: usize,

    // Provider
    pub whazzup_url: String,
    pub fetch_timeout: Duration,
    pub cache_ttl: Duration,

    // Detection
    pub watch: WatchSet,
    pub poll_interval: Duration,
    pub window_grace_cycles: u64,
    pub baseline_on_startup: bool,
}

impl Config {
    /// Load from the process environment, after applying `.env` if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let channel_id = get("FLIGHTWATCH_CHANNEL_ID")
            .ok_or_else(|| {
                Error::Config("FLIGHTWATCH_CHANNEL_ID environment variable is required".to_string())
            })?
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| Error::Config(format!("FLIGHTWATCH_CHANNEL_ID is not a chat id: {e}")))?;

        let watch = WatchSet::new(parse_csv_upper(
            get("WATCH_AIRPORTS").unwrap_or_else(|| DEFAULT_WATCH_AIRPORTS.to_string()),
        ))?;

        let whazzup_url = get("WHAZZUP_URL").unwrap_or_else(|| DEFAULT_WHAZZUP_URL.to_string());

        let cache_ttl = Duration::from_secs(parse_u64(&get, "CACHE_TTL_SECS")?.unwrap_or(120));
        let poll_interval =
            Duration::from_secs(parse_u64(&get, "POLL_INTERVAL_SECS")?.unwrap_or(300));
        if poll_interval.is_zero() {
            return Err(Error::Config(
                "POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        let fetch_timeout =
            Duration::from_secs(parse_u64(&get, "FETCH_TIMEOUT_SECS")?.unwrap_or(15).max(1));

        let window_grace_cycles = parse_u64(&get, "WINDOW_GRACE_CYCLES")?.unwrap_or(3);
        let baseline_on_startup = get("BASELINE_ON_STARTUP")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        let telegram_safe_limit = parse_u64(&get, "TELEGRAM_SAFE_LIMIT")?
            .map(|v| v as usize)
            .unwrap_or(4000)
            .clamp(200, 4096);

        Ok(Self {
            telegram_bot_token,
            channel_id,
            telegram_safe_limit,
            whazzup_url,
            fetch_timeout,
            cache_ttl,
            watch,
            poll_interval,
            window_grace_cycles,
            baseline_on_startup,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() || env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| Error::Config(format!("{key} must be a non-negative integer: {e}")))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_csv_upper(v: String) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
