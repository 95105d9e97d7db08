use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UPSError};
use crate::mailer::MailerSettings;
use crate::monitor::Thresholds;

// The following define polling behaviour and shutdown behaviour.
const TIMEOUT_SECS: u64 = 10; // Seconds before a request to the card is abandoned.
const POLL_DELAY: u64 = 10; // Seconds to wait between polls.
const ON_BATTERY_POLL_DELAY: u64 = 2; // Seconds to wait between polls while on battery.
const COMMUNICATION_FAILED_POLL_DELAY: u64 = 5; // Seconds to wait between polls if communication failed.
const SECONDS_TO_SHUTDOWN: u64 = 300; // Seconds on battery before shutting down. 0 means never.
const BATTERY_LOW_THRESHOLD: f32 = 50.0; // Charge percentage considered low.
const OUTPUT_OFF_DELAY: u32 = 120; // Seconds the UPS waits before cutting output after a shutdown. 0 leaves it on.

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Settings {
    pub url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,

    pub poll_delay: u64,
    pub on_battery_poll_delay: u64,
    pub communication_failed_poll_delay: u64,
    pub seconds_to_shutdown: u64,
    pub battery_low_threshold: f32,
    pub output_off_delay: u32,
    /// Program and arguments run to stop the host, e.g. `["shutdown", "-h", "now"]`.
    pub shutdown_command: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            url: String::new(),
            username: "admin".to_string(),
            password: String::new(),
            timeout_secs: TIMEOUT_SECS,
            accept_invalid_certs: false,
            poll_delay: POLL_DELAY,
            on_battery_poll_delay: ON_BATTERY_POLL_DELAY,
            communication_failed_poll_delay: COMMUNICATION_FAILED_POLL_DELAY,
            seconds_to_shutdown: SECONDS_TO_SHUTDOWN,
            battery_low_threshold: BATTERY_LOW_THRESHOLD,
            output_off_delay: OUTPUT_OFF_DELAY,
            shutdown_command: Vec::new(),
        }
    }
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Settings {
    /// Defaults, then the TOML file, then `UPS_*` environment variables,
    /// then command line overrides.
    pub fn load(path: &Path, overrides: &Overrides) -> Result<Settings> {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("UPS_"));
        Settings::from_figment(figment, overrides)
    }

    pub fn from_figment(figment: Figment, overrides: &Overrides) -> Result<Settings> {
        let mut figment = figment;
        if let Some(url) = &overrides.url {
            figment = figment.merge(Serialized::default("url", url));
        }
        if let Some(username) = &overrides.username {
            figment = figment.merge(Serialized::default("username", username));
        }
        if let Some(password) = &overrides.password {
            figment = figment.merge(Serialized::default("password", password));
        }

        let settings: Settings = figment.extract()?;
        if settings.url.trim().is_empty() {
            return Err(UPSError::Config(
                "no UPS url configured (set `url` or pass --url)".to_string(),
            ));
        }
        Ok(settings)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            poll_delay: self.poll_delay,
            on_battery_poll_delay: self.on_battery_poll_delay,
            communication_failed_poll_delay: self.communication_failed_poll_delay,
            seconds_to_shutdown: self.seconds_to_shutdown,
            battery_low_threshold: self.battery_low_threshold,
        }
    }
}

/// Mail settings are optional; a missing file disables mail alerts.
pub fn load_mailer_settings(path: &Path) -> Result<Option<MailerSettings>> {
    if !path.exists() {
        return Ok(None);
    }
    let settings = Figment::new().merge(Toml::file(path)).extract()?;
    Ok(Some(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figment(toml: &str) -> Figment {
        Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml))
    }

    #[test]
    fn test_file_values_over_defaults() {
        let settings = Settings::from_figment(
            figment(
                r#"
                url = "http://10.0.0.20"
                password = "secret"
                poll_delay = 30
                shutdown_command = ["/usr/sbin/shutdown", "-h", "now"]
                "#,
            ),
            &Overrides::default(),
        )
        .unwrap();

        assert_eq!(settings.url, "http://10.0.0.20");
        assert_eq!(settings.username, "admin");
        assert_eq!(settings.poll_delay, 30);
        assert_eq!(settings.on_battery_poll_delay, ON_BATTERY_POLL_DELAY);
        assert_eq!(settings.shutdown_command.len(), 3);
    }

    #[test]
    fn test_overrides_win() {
        let settings = Settings::from_figment(
            figment("url = \"10.0.0.20\"\nusername = \"ops\""),
            &Overrides {
                url: Some("10.0.0.21".to_string()),
                username: None,
                password: Some("pw".to_string()),
            },
        )
        .unwrap();

        assert_eq!(settings.url, "10.0.0.21");
        assert_eq!(settings.username, "ops");
        assert_eq!(settings.password, "pw");
    }

    #[test]
    fn test_url_required() {
        assert!(matches!(
            Settings::from_figment(figment(""), &Overrides::default()),
            Err(UPSError::Config(_))
        ));
    }

    #[test]
    fn test_bad_type_is_config_error() {
        assert!(matches!(
            Settings::from_figment(figment("url = \"x\"\npoll_delay = \"soon\""), &Overrides::default()),
            Err(UPSError::Config(_))
        ));
    }

    #[test]
    fn test_missing_mailer_file() {
        assert_eq!(
            load_mailer_settings(Path::new("/nonexistent/mailer.toml")).unwrap(),
            None
        );
    }

    #[test]
    fn test_thresholds() {
        let thresholds = Settings::default().thresholds();
        assert_eq!(thresholds.seconds_to_shutdown, SECONDS_TO_SHUTDOWN);
        assert_eq!(thresholds.battery_low_threshold, BATTERY_LOW_THRESHOLD);
    }
}
