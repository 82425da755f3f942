use std::env;

use crate::error::DispatchError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub confirmed_queue_size: usize,
    pub event_buffer_size: usize,
    pub otp_length: usize,
    /// When set, offers are only shown to partners within this many km of
    /// the delivery address; unset means every online partner is eligible.
    pub broadcast_radius_km: Option<f64>,
}

impl Config {
    pub fn from_env() -> Result<Self, DispatchError> {
        let _ = dotenvy::dotenv();

        let broadcast_radius_km = match env::var("BROADCAST_RADIUS_KM") {
            Ok(raw) => Some(raw.parse::<f64>().map_err(|err| {
                DispatchError::Internal(format!("invalid BROADCAST_RADIUS_KM: {err}"))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            confirmed_queue_size: parse_or_default("CONFIRMED_QUEUE_SIZE", 1024)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            otp_length: parse_or_default("OTP_LENGTH", 6)?,
            broadcast_radius_km,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, DispatchError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| DispatchError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
