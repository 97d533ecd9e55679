//! The unified weather record returned by every query, and the normalized
//! air-quality sample attached to it.

use serde::{Deserialize, Serialize};

/// One reconciled weather reading for a location.
///
/// Field precedence: every field reflects the highest-precedence source that
/// successfully supplied it for this request (CWA observations override the
/// OpenWeatherMap baseline inside Taiwan). `source` lists every contributing
/// upstream, in application order, joined with `", "`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    /// Display name of the place, localized where possible.
    pub location: String,
    /// County/city-level region name, when distinct from `location`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Air temperature in °C.
    pub temperature: f64,
    pub description: String,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// Provider icon code (OpenWeatherMap scheme).
    pub icon: String,
    /// Apparent temperature in °C.
    pub feels_like: f64,
    /// Pressure in hPa.
    pub pressure: f64,
    /// Visibility in km.
    pub visibility: f64,
    /// RFC 3339 timestamp of when this record was assembled.
    pub timestamp: String,
    /// Contributing sources, in application order, joined with `", "`.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_quality: Option<AirQuality>,
}

/// Air-quality sample normalized onto a 1–5 ordinal level regardless of the
/// source's native scale.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AirQuality {
    /// Normalized level: 1 (good) through 5 (very unhealthy).
    pub aqi: u8,
    /// Human-readable level description.
    pub description: String,
    pub components: PollutantComponents,
}

/// Pollutant concentrations in μg/m³ (CO in the provider's native unit).
/// Field names match the OpenWeatherMap `air_pollution` component keys.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PollutantComponents {
    #[serde(default)]
    pub co: f64,
    #[serde(default)]
    pub no: f64,
    #[serde(default)]
    pub no2: f64,
    #[serde(default)]
    pub o3: f64,
    #[serde(default)]
    pub so2: f64,
    #[serde(default)]
    pub pm2_5: f64,
    #[serde(default)]
    pub pm10: f64,
    #[serde(default)]
    pub nh3: f64,
}

/// Description for a normalized 1–5 AQI level, in the localization the
/// original deployment serves.
pub fn aqi_level_description(level: u8) -> &'static str {
    match level {
        1 => "優良",
        2 => "普通",
        3 => "對敏感族群不健康",
        4 => "對所有族群不健康",
        5 => "非常不健康",
        _ => "未知",
    }
}
