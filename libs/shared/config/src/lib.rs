use std::env;
use tracing::warn;

pub const DEFAULT_WORKING_HOURS_START: &str = "08:00";
pub const DEFAULT_WORKING_HOURS_END: &str = "18:00";
pub const DEFAULT_SLOT_DURATION_MINUTES: u32 = 30;
pub const DEFAULT_API_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub appointment_api_url: String,
    pub appointment_api_key: Option<String>,
    pub working_hours_start: String,
    pub working_hours_end: String,
    pub slot_duration_minutes: u32,
    pub api_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            appointment_api_url: String::new(),
            appointment_api_key: None,
            working_hours_start: DEFAULT_WORKING_HOURS_START.to_string(),
            working_hours_end: DEFAULT_WORKING_HOURS_END.to_string(),
            slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            api_port: DEFAULT_API_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            appointment_api_url: env::var("APPOINTMENT_API_URL")
                .unwrap_or_else(|_| {
                    warn!("APPOINTMENT_API_URL not set, using empty value");
                    String::new()
                }),
            appointment_api_key: env::var("APPOINTMENT_API_KEY").ok(),
            working_hours_start: env::var("CLINIC_WORKING_HOURS_START")
                .unwrap_or_else(|_| DEFAULT_WORKING_HOURS_START.to_string()),
            working_hours_end: env::var("CLINIC_WORKING_HOURS_END")
                .unwrap_or_else(|_| DEFAULT_WORKING_HOURS_END.to_string()),
            slot_duration_minutes: parse_or_default(
                "APPOINTMENT_SLOT_DURATION_MINUTES",
                DEFAULT_SLOT_DURATION_MINUTES,
            ),
            api_port: parse_or_default("API_PORT", DEFAULT_API_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.appointment_api_url.is_empty()
    }
}

fn parse_or_default<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
