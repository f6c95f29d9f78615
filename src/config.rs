use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Defaults, overridable through the environment.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_RECORDS_PATH: &str = "records.csv";
const DEFAULT_REFRESH_SECS: u64 = 300;
const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_ATTEMPT_WINDOW_SECS: u64 = 600;

/// Runtime configuration for the verification service
///
/// Every setting has a default and can be overridden through an environment
/// variable, so the binary runs with no configuration at all during
/// development.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the web server binds to (`CERTCHECK_BIND`)
    pub bind_addr: String,

    /// Location of the exported record table (`CERTCHECK_RECORDS`)
    pub records_path: PathBuf,

    /// How long a loaded record snapshot stays fresh (`CERTCHECK_REFRESH_SECS`)
    pub refresh_interval: Duration,

    /// Lookup attempts allowed per session window (`CERTCHECK_MAX_ATTEMPTS`)
    pub max_attempts: u32,

    /// Length of the attempt-counting window (`CERTCHECK_ATTEMPT_WINDOW_SECS`)
    pub attempt_window: Duration,
}

impl Config {
    /// Build the configuration from the environment, falling back to defaults
    ///
    /// Unset variables use the default silently; set-but-unparseable values
    /// are logged and replaced by the default rather than aborting startup.
    pub fn from_env() -> Self {
        Config {
            bind_addr: env::var("CERTCHECK_BIND").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            records_path: PathBuf::from(
                env::var("CERTCHECK_RECORDS").unwrap_or_else(|_| DEFAULT_RECORDS_PATH.to_string()),
            ),
            refresh_interval: Duration::from_secs(parsed_var(
                "CERTCHECK_REFRESH_SECS",
                DEFAULT_REFRESH_SECS,
            )),
            max_attempts: parsed_var("CERTCHECK_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS),
            attempt_window: Duration::from_secs(parsed_var(
                "CERTCHECK_ATTEMPT_WINDOW_SECS",
                DEFAULT_ATTEMPT_WINDOW_SECS,
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            records_path: PathBuf::from(DEFAULT_RECORDS_PATH),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_window: Duration::from_secs(DEFAULT_ATTEMPT_WINDOW_SECS),
        }
    }
}

fn parsed_var<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("ignoring invalid {} value \"{}\"", key, value);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_need_no_environment() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.records_path, PathBuf::from("records.csv"));
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.attempt_window, Duration::from_secs(600));
    }
}
