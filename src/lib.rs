pub mod app;
pub mod calendar;
pub mod cli;
pub mod composer;
pub mod config;
pub mod confirm;
pub mod contacts;
pub mod env_manager;
pub mod parser;
pub mod time_parser;
pub mod validation;

use anyhow::{Context, Result};
use log::*;

use crate::calendar::GoogleCalendarStore;
use crate::env_manager::Credentials;
use crate::parser::{GroqClient, IntentExtractor};

/// Everything a request needs, resolved once at startup
pub struct Runtime {
    pub config: Config,
    pub app: app::Application,
}

/// Load configuration, contacts and credentials and wire up the pipeline.
///
/// Any failure here is a startup-fatal configuration error.
pub fn bootstrap() -> Result<Runtime> {
    env_manager::load_env_file();

    let config_path = config::get_config_path()?;
    let config = Config::load_from(&config_path)?;
    let time_zone = config.time_zone()?;

    let contacts_path = config.contacts_path(&config_path);
    let directory = contacts::ContactDirectory::load(&contacts_path)
        .with_context(|| format!("Could not load contacts from {:?}", contacts_path))?;
    info!("Contact directory ready with {} name(s)", directory.len());

    let credentials = Credentials::from_env()?;
    let oracle =
        GroqClient::new(credentials.oracle_api_key, &config.language_model, config.timeout())?;
    let store =
        GoogleCalendarStore::new(credentials.calendar_token, &config.calendar, config.timeout())?;

    let app = app::Application::new(
        directory,
        IntentExtractor::new(Box::new(oracle), time_zone),
        Box::new(store),
        time_zone,
    );
    Ok(Runtime { config, app })
}

/// Set up env_logger. `HUDDLE_LOG_LEVEL` is a shorthand for `RUST_LOG`; default is warn.
pub fn init_logger() {
    let default_level = std::env::var("HUDDLE_LOG_LEVEL").unwrap_or_else(|_| "warn".into());
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", default_level))
        .format(|buf, record| {
            use chrono::Local;
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

// Re-export commonly used types
pub use config::Config;
pub use contacts::ContactDirectory;
pub use composer::CandidateEvent;
