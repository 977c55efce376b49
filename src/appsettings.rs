use std::sync::OnceLock;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct TelegramSettings {
    pub token: String,
}

#[derive(Deserialize, Debug)]
pub struct ReminderSettings {
    /// Personal reminder delay after the last recorded drink, in minutes.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// Enables the stateless interval broadcaster instead of relying only
    /// on the per-user timers.
    #[serde(default)]
    pub broadcast_enabled: bool,
    #[serde(default = "default_broadcast_interval_minutes")]
    pub broadcast_interval_minutes: u64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            broadcast_enabled: false,
            broadcast_interval_minutes: default_broadcast_interval_minutes(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct LocalizationSettings {
    #[serde(default = "default_locales_dir")]
    pub locales_dir: String,
}

impl Default for LocalizationSettings {
    fn default() -> Self {
        Self {
            locales_dir: default_locales_dir(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub reminders: ReminderSettings,
    #[serde(default)]
    pub localization: LocalizationSettings,
}

fn default_interval_minutes() -> u64 {
    120
}

fn default_broadcast_interval_minutes() -> u64 {
    120
}

fn default_locales_dir() -> String {
    "locales".to_owned()
}

impl AppSettings {
    fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

pub fn get() -> &'static AppSettings {
    static APPSETTINGS: OnceLock<AppSettings> = OnceLock::new();
    APPSETTINGS.get_or_init(|| AppSettings::new().expect("Failed to load application settings."))
}
