//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

/// Store used when neither the config file nor the environment names one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://movies.db?mode=rwc";

/// Load .env exactly once (working directory first, then the project root).
/// Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_err() {
            let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
            let _ = dotenv::from_filename(candidate);
        }
    });
}

/// Common bootstrap for CLI binaries: dotenv + a startup line.
pub fn bootstrap_cli(bin_name: &str) {
    init_env();
    info!(target = "bootstrap", bin = bin_name, "starting");
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_opt(key)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    match env_opt(key) {
        Some(raw) => {
            let v = raw.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "on" | "yes")
        }
        None => default,
    }
}

/// Database URL from the environment (`REEL_DATABASE_URL`, then `DATABASE_URL`).
pub fn db_url() -> Option<String> {
    ["REEL_DATABASE_URL", "DATABASE_URL"]
        .into_iter()
        .find_map(env_opt)
}

/// Strip credentials from a connection string so it can be logged.
pub fn redact_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(mut u) => {
            if !u.username().is_empty() {
                let _ = u.set_username("***");
            }
            if u.password().is_some() {
                let _ = u.set_password(Some("***"));
            }
            u.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Log a consolidated, redacted snapshot of the effective configuration.
pub fn log_snapshot(title: &str, entries: &[(&str, String)]) {
    let snapshot: Vec<(String, String)> = entries
        .iter()
        .map(|(k, v)| (k.to_string(), redact_value(k, v)))
        .collect();
    info!(target = "preflight", title, snapshot = ?snapshot, "configuration snapshot");
}

fn redact_value(key: &str, val: &str) -> String {
    let k = key.to_ascii_uppercase();
    if k.contains("PASSWORD") || k.contains("SECRET") || k.contains("TOKEN") {
        return "***".to_string();
    }
    if k.contains("URL") || k.contains("DSN") {
        return redact_url(val);
    }
    val.trim().to_string()
}
