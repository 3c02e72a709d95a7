//! Logging initialization for the dashboard client.
//!
//! Human-readable logs go to stderr. Setting `FINWATCH_LOG_JSON=1` also
//! appends structured JSONL to `~/.finwatch/logs/finwatch.jsonl`.

use crate::Paths;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the logging system.
///
/// The filter comes from `RUST_LOG` when set, otherwise from `level`.
/// Calling this more than once is a no-op.
pub fn init_logging(level: &str, paths: Option<&Paths>) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(parse_level(level).into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(std::io::stderr);

    let json_layer = json_log_enabled()
        .then_some(paths)
        .flatten()
        .and_then(|paths| {
            paths.ensure_dirs().ok()?;
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(paths.log_file())
                .ok()
        })
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_writer(Mutex::new(file))
        });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(json_layer)
        .try_init();
}

fn json_log_enabled() -> bool {
    matches!(
        std::env::var("FINWATCH_LOG_JSON").as_deref(),
        Ok("1") | Ok("true")
    )
}

/// Map a `--log-level`/config value onto a filter. Unrecognised values fall
/// back to `info`; `off` silences everything.
pub fn parse_level(level: &str) -> LevelFilter {
    let normalized = level.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "off" | "none" => LevelFilter::OFF,
        "warning" => LevelFilter::WARN,
        other => other.parse().unwrap_or(LevelFilter::INFO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_levels_map_to_filters() {
        let cases = [
            ("trace", LevelFilter::TRACE),
            ("debug", LevelFilter::DEBUG),
            ("info", LevelFilter::INFO),
            ("warn", LevelFilter::WARN),
            ("warning", LevelFilter::WARN),
            ("error", LevelFilter::ERROR),
            ("off", LevelFilter::OFF),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_level(input), expected, "level {input}");
        }
    }

    #[test]
    fn test_level_names_ignore_case_and_padding() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::DEBUG);
        assert_eq!(parse_level(" Warn "), LevelFilter::WARN);
    }

    #[test]
    fn test_garbage_level_is_info() {
        assert_eq!(parse_level(""), LevelFilter::INFO);
        assert_eq!(parse_level("chatty"), LevelFilter::INFO);
    }

    #[test]
    fn test_second_init_is_ignored() {
        init_logging("debug", None);
        init_logging("info", None);
    }
}
