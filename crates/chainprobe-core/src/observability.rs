//! Process-wide tracing subscriber.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

const DEFAULT_FILTER: &str = "info";
const DEFAULT_LOG_FILE: &str = "chainprobe.logs.jsonl";

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `CHAINPROBE_OBSERVABILITY`; anything but `0`, `false`, `off` or `no`
    /// keeps logging on.
    pub enabled: bool,
    /// `CHAINPROBE_LOG_LEVEL`, falling back to `RUST_LOG`.
    pub filter: Option<String>,
    /// `CHAINPROBE_JSON_LOG_PATH`; replaces the stderr console output.
    pub json_path: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup("CHAINPROBE_OBSERVABILITY").is_none_or(|raw| {
            !matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            )
        });
        Self {
            enabled,
            filter: lookup("CHAINPROBE_LOG_LEVEL").or_else(|| lookup("RUST_LOG")),
            json_path: lookup("CHAINPROBE_JSON_LOG_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        self.filter
            .as_deref()
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
    }
}

fn json_file(path: &Path) -> RollingFileAppender {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let _ = std::fs::create_dir_all(dir);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    tracing_appender::rolling::never(dir, file_name)
}

/// Installs the subscriber from the process environment. Later calls are no-ops.
pub fn init_observability() {
    init_with(&LogSettings::from_lookup(|key| std::env::var(key).ok()));
}

pub fn init_with(settings: &LogSettings) {
    INIT.get_or_init(|| {
        if !settings.enabled {
            return;
        }
        let json = settings.json_path.as_deref().map(|path| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(json_file(path))
        });
        // stdout belongs to the `watch` and `run` renderers.
        let console = json.is_none().then(|| {
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr)
        });
        let _ = tracing_subscriber::registry()
            .with(settings.env_filter())
            .with(json)
            .with(console)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> LogSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_log_to_console_at_info() {
        let defaults = settings(&[]);
        assert!(defaults.enabled);
        assert_eq!(defaults.filter, None);
        assert_eq!(defaults.json_path, None);
        assert_eq!(defaults.env_filter().to_string(), DEFAULT_FILTER);
    }

    #[test]
    fn enable_flag_accepts_common_spellings() {
        assert!(!settings(&[("CHAINPROBE_OBSERVABILITY", " Off ")]).enabled);
        assert!(!settings(&[("CHAINPROBE_OBSERVABILITY", "0")]).enabled);
        assert!(settings(&[("CHAINPROBE_OBSERVABILITY", "yes")]).enabled);
    }

    #[test]
    fn log_level_wins_over_rust_log() {
        let both = settings(&[("CHAINPROBE_LOG_LEVEL", "debug"), ("RUST_LOG", "warn")]);
        assert_eq!(both.filter.as_deref(), Some("debug"));
        let fallback = settings(&[("RUST_LOG", "warn")]);
        assert_eq!(fallback.filter.as_deref(), Some("warn"));
    }

    #[test]
    fn blank_json_path_keeps_console_output() {
        assert_eq!(settings(&[("CHAINPROBE_JSON_LOG_PATH", " ")]).json_path, None);
        assert_eq!(
            settings(&[("CHAINPROBE_JSON_LOG_PATH", "logs/run.jsonl")]).json_path,
            Some(PathBuf::from("logs/run.jsonl"))
        );
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_observability();
        init_observability();
    }
}
