use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Filter used by the pipeline binary when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// `RUST_LOG` when set and valid, else `fallback`, else plain `info`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global fmt subscriber shared by every binary.
///
/// Row-level skips are logged with `dataset` and `line` fields, so file and
/// line of the emitting call site are left out to keep those lines short.
pub fn init_tracing(fallback: &str) -> Result<(), anyhow::Error> {
    SubscriberBuilder::default()
        .with_env_filter(env_filter(fallback))
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn fallback_filter_is_used_or_replaced() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(env_filter("warn").max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            env_filter("debug,sqlx=loud").max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
