//! Structured logging for the orrery viewer.
//!
//! Console output with timestamps and module paths via the `tracing`
//! ecosystem, plus JSON file logging in debug builds for post-mortem
//! analysis. Respects `RUST_LOG` and the config system's log level setting.

use orrery_config::Config;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Sets up structured logging with:
/// - Console output with timestamps, module paths, and severity levels
/// - JSON file logging in debug builds (optional)
/// - Environment-based filtering (respects RUST_LOG)
/// - Integration with the config system's log_level setting
///
/// # Arguments
///
/// * `log_dir` - Optional directory for JSON log files (debug builds only)
/// * `debug_build` - Whether this is a debug build (enables file logging)
/// * `config` - Optional configuration to use for log level override
///
/// # Examples
///
/// ```no_run
/// use orrery_log::init_logging;
/// use orrery_config::Config;
///
/// // Basic initialization
/// init_logging(None, false, None);
///
/// // With file logging in debug mode
/// let log_dir = std::path::Path::new("./logs");
/// init_logging(Some(log_dir), true, None);
///
/// // With config override
/// let config = Config::default();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = if let Some(config) = config {
        if !config.debug.log_level.is_empty() {
            config.debug.log_level.clone()
        } else {
            "info,wgpu=warn,naga=warn".to_string()
        }
    } else {
        "info,wgpu=warn,naga=warn".to_string()
    };

    // Base filter: info by default, overridable via RUST_LOG env var
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    // In debug builds, also log to a file for post-mortem analysis
    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join("orrery.log"))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Create an `EnvFilter` with the default filter string.
///
/// Enables `info` for all targets, with `wgpu` and `naga` capped at `warn`
/// to keep their per-frame chatter out of the console.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info,wgpu=warn,naga=warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        let filter = default_env_filter();
        let filter_str = format!("{}", filter);
        assert!(filter_str.contains("wgpu=warn"));
        assert!(filter_str.contains("naga=warn"));
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_subsystem_filter() {
        let filter = EnvFilter::new("info,orrery_sim=debug");
        let filter_str = format!("{}", filter);
        assert!(filter_str.contains("orrery_sim=debug"));
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,orrery_render=trace",
            "warn,orrery_scene=debug,orrery_sim=trace",
            "error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_config_log_level_is_used() {
        let mut config = Config::default();
        config.debug.log_level = "trace".to_string();
        // The filter string mirrors what init_logging derives from the config.
        let filter = EnvFilter::new(&config.debug.log_level);
        assert!(format!("{}", filter).contains("trace"));
    }

    #[test]
    fn test_json_log_lines_parse() {
        // The file layer emits one JSON object per line; verify the shape we
        // rely on for post-mortem tooling parses.
        let line = r#"{"timestamp":"0.003","level":"INFO","fields":{"message":"ready"},"target":"orrery_app"}"#;
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["fields"]["message"], "ready");
    }

    #[test]
    fn test_file_logger_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path();

        std::fs::create_dir_all(log_path).unwrap();
        let log_file_path = log_path.join("orrery.log");
        assert_eq!(log_file_path.file_name().unwrap(), "orrery.log");
    }
}
