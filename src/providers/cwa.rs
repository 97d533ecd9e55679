//! Central Weather Administration (中央氣象署) automatic-station observations.
//!
//! Uses the O-A0001-001 bulk dataset: the full list of open stations is
//! fetched once per TTL window and the nearest station to the query point is
//! selected locally. Station readings use sentinel values (e.g. -99) to mark
//! an offline instrument; a sentinel on the nearest station suppresses the
//! CWA contribution for that request.

use crate::geo::LatLon;
use crate::providers::error::ProviderError;
use crate::stations::cache::StationCache;
use crate::stations::locate::nearest_station;
use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DATA_URL: &str = "https://opendata.cwa.gov.tw/api/v1/rest/datastore/O-A0001-001";
// Automatic stations report every 10 minutes or so.
const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CwaStation {
    station_name: String,
    #[allow(dead_code)]
    station_id: String,
    geo_info: GeoInfo,
    weather_element: WeatherElement,
    obs_time: ObsTime,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
struct GeoInfo {
    coordinates: Vec<StationCoordinate>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
struct StationCoordinate {
    coordinate_name: String,
    station_latitude: f64,
    station_longitude: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
struct WeatherElement {
    air_temperature: f64,
    relative_humidity: f64,
    wind_speed: f64,
    #[serde(default)]
    weather: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
struct ObsTime {
    date_time: String,
}

#[derive(Debug, Deserialize)]
struct CwaResponse {
    success: String,
    #[serde(default)]
    records: Option<CwaRecords>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CwaRecords {
    #[serde(default)]
    station: Vec<CwaStation>,
}

/// The reading of the nearest CWA station, still in provider units
/// (wind in m/s).
#[derive(Debug, Clone, PartialEq)]
pub struct CwaObservation {
    pub station_name: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed_ms: f64,
    pub description: String,
    pub observed_at: String,
    pub distance_km: f64,
}

pub(crate) struct CwaClient {
    api_key: Option<String>,
    cache: StationCache<CwaStation>,
}

impl CwaClient {
    pub(crate) fn new(api_key: Option<String>, http: Client) -> Self {
        let key_for_fetch = api_key.clone();
        let cache = StationCache::new(CACHE_TTL, move || {
            let http = http.clone();
            let key = key_for_fetch.clone();
            Box::pin(async move { fetch_stations(http, key).await })
                as BoxFuture<'static, Result<Vec<CwaStation>, ProviderError>>
        });
        Self { api_key, cache }
    }

    /// Reading of the station nearest to `at`, or `None` when the credential
    /// is absent, the station list is unavailable, or the nearest station
    /// reports sentinel values.
    pub(crate) async fn nearest_observation(&self, at: LatLon) -> Option<CwaObservation> {
        self.api_key.as_ref()?;

        let stations = self.cache.get_all().await;
        let (station, distance_km) =
            nearest_station(at, &stations, wgs84_position, reading_is_valid)?;

        let wind = station.weather_element.wind_speed;
        Some(CwaObservation {
            station_name: station.station_name.clone(),
            temperature: station.weather_element.air_temperature,
            humidity: station.weather_element.relative_humidity,
            // Negative wind is the "no data" sentinel; treat as calm.
            wind_speed_ms: if wind < 0.0 { 0.0 } else { wind },
            description: station
                .weather_element
                .weather
                .clone()
                .filter(|w| !w.is_empty())
                .unwrap_or_else(|| "多雲".to_string()),
            observed_at: station.obs_time.date_time.clone(),
            distance_km,
        })
    }
}

fn wgs84_position(station: &CwaStation) -> Option<LatLon> {
    station
        .geo_info
        .coordinates
        .iter()
        .find(|c| c.coordinate_name == "WGS84")
        .map(|c| LatLon(c.station_latitude, c.station_longitude))
}

// -99 style sentinels mean the instrument is offline.
fn reading_is_valid(station: &CwaStation) -> bool {
    station.weather_element.air_temperature >= -50.0 && station.weather_element.relative_humidity >= 0.0
}

async fn fetch_stations(http: Client, api_key: Option<String>) -> Result<Vec<CwaStation>, ProviderError> {
    let key = api_key.ok_or(ProviderError::MissingKey)?;

    let response = http
        .get(DATA_URL)
        .query(&[
            ("Authorization", key.as_str()),
            ("format", "JSON"),
            ("StationStatus", "OPEN"),
        ])
        .send()
        .await
        .map_err(|source| ProviderError::Network {
            url: DATA_URL.to_string(),
            source,
        })?;
    let response = ProviderError::from_status(DATA_URL, response)?;

    let body: CwaResponse = response
        .json()
        .await
        .map_err(|source| ProviderError::Decode {
            url: DATA_URL.to_string(),
            source,
        })?;

    stations_from_response(DATA_URL, body)
}

// A body-level failure must surface as an error so the cache's failure path
// applies (empty result, TTL clock untouched) instead of caching an empty
// snapshot for a full window.
fn stations_from_response(url: &str, body: CwaResponse) -> Result<Vec<CwaStation>, ProviderError> {
    if body.success != "true" {
        return Err(ProviderError::UpstreamFailure {
            url: url.to_string(),
            detail: format!("success={}", body.success),
        });
    }
    Ok(body.records.map(|r| r.station).unwrap_or_default())
}
