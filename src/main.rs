use certcheck::app;
use certcheck::config::Config;

/// Main entry point for the verification web application
///
/// Initializes logging, loads the environment-driven configuration and runs
/// the web server until the process is stopped.
///
/// # Environment
/// * `CERTCHECK_BIND` - Bind address (default `127.0.0.1:3000`)
/// * `CERTCHECK_RECORDS` - Path to the exported record table (default
///   `records.csv`)
/// * `CERTCHECK_REFRESH_SECS` - Record cache refresh interval
/// * `CERTCHECK_MAX_ATTEMPTS` / `CERTCHECK_ATTEMPT_WINDOW_SECS` - Lookup
///   attempt budget per session
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env();
    log::info!(
        "starting certificate verification service, record table at {}",
        config.records_path.display()
    );

    app::run(config).await
}
