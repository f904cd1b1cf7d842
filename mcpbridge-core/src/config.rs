//! Environment-driven configuration (§6, §10.3).
//!
//! Every input has a documented fallback; `Config::load` never panics
//! and never returns a `Result`, matching the reference implementation's
//! "non-integer port falls back to default" rule literally.

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 9877;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: log::LevelFilter,
}

impl Config {
    pub fn load() -> Self {
        let host = std::env::var("ABLETON_MCP_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = match std::env::var("ABLETON_MCP_PORT") {
            Ok(raw) => match raw.trim().parse::<u16>() {
                Ok(p) => p,
                Err(_) => {
                    log::warn!(
                        "ABLETON_MCP_PORT={:?} is not a valid port, falling back to {}",
                        raw,
                        DEFAULT_PORT
                    );
                    DEFAULT_PORT
                }
            },
            Err(_) => DEFAULT_PORT,
        };

        let log_level = std::env::var("ABLETON_MCP_LOG")
            .ok()
            .and_then(|raw| parse_log_level(&raw))
            .unwrap_or(log::LevelFilter::Info);

        Config {
            host,
            port,
            log_level,
        }
    }
}

fn parse_log_level(s: &str) -> Option<log::LevelFilter> {
    match s.to_ascii_lowercase().as_str() {
        "off" => Some(log::LevelFilter::Off),
        "error" => Some(log::LevelFilter::Error),
        "warn" => Some(log::LevelFilter::Warn),
        "info" => Some(log::LevelFilter::Info),
        "debug" => Some(log::LevelFilter::Debug),
        "trace" => Some(log::LevelFilter::Trace),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_log_levels() {
        assert_eq!(parse_log_level("debug"), Some(log::LevelFilter::Debug));
        assert_eq!(parse_log_level("WARN"), Some(log::LevelFilter::Warn));
        assert_eq!(parse_log_level("nonsense"), None);
    }
}
