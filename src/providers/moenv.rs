//! Ministry of Environment (環境部) air-quality station network.
//!
//! Uses the aqx_p_432 dataset. Every numeric field arrives as a string and
//! may be empty when the station is under maintenance; unparsable values
//! default to 0, and a negative AQI on the nearest station suppresses the
//! MOENV contribution for that request.

use crate::geo::LatLon;
use crate::providers::error::ProviderError;
use crate::stations::cache::StationCache;
use crate::stations::locate::nearest_station;
use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DATA_URL: &str = "https://data.moenv.gov.tw/api/v2/aqx_p_432";
// AQI updates hourly; 20 minutes keeps the snapshot reasonably fresh.
const CACHE_TTL: Duration = Duration::from_secs(20 * 60);
// High enough to cover the whole national network (~85 stations).
const FETCH_LIMIT: &str = "1000";

#[derive(Debug, Deserialize, Clone)]
pub(crate) struct MoenvStation {
    sitename: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    aqi: String,
    #[serde(default)]
    so2: String,
    #[serde(default)]
    co: String,
    #[serde(default)]
    o3: String,
    #[serde(default)]
    pm10: String,
    #[serde(rename = "pm2.5", default)]
    pm2_5: String,
    #[serde(default)]
    no2: String,
    #[serde(default)]
    longitude: String,
    #[serde(default)]
    latitude: String,
    #[serde(default)]
    publishtime: String,
}

// `records` is deliberately required: a payload without it is malformed and
// must fail the fetch, not cache an empty snapshot for a full TTL window.
#[derive(Debug, Deserialize)]
struct MoenvResponse {
    records: Vec<MoenvStation>,
}

/// The sample of the nearest MOENV station, with the AQI still on the
/// provider's native 0–500 scale.
#[derive(Debug, Clone, PartialEq)]
pub struct MoenvAqi {
    pub station_name: String,
    pub aqi: f64,
    pub status: String,
    pub pm2_5: f64,
    pub pm10: f64,
    pub o3: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
    pub published_at: String,
    pub distance_km: f64,
}

pub(crate) struct MoenvClient {
    api_key: Option<String>,
    cache: StationCache<MoenvStation>,
}

impl MoenvClient {
    pub(crate) fn new(api_key: Option<String>, http: Client) -> Self {
        let key_for_fetch = api_key.clone();
        let cache = StationCache::new(CACHE_TTL, move || {
            let http = http.clone();
            let key = key_for_fetch.clone();
            Box::pin(async move { fetch_stations(http, key).await })
                as BoxFuture<'static, Result<Vec<MoenvStation>, ProviderError>>
        });
        Self { api_key, cache }
    }

    /// Sample of the station nearest to `at`, or `None` when the credential
    /// is absent, the station list is unavailable, or the nearest station
    /// reports an invalid AQI.
    pub(crate) async fn nearest_aqi(&self, at: LatLon) -> Option<MoenvAqi> {
        self.api_key.as_ref()?;

        let stations = self.cache.get_all().await;
        let (station, distance_km) =
            nearest_station(at, &stations, station_position, sample_is_valid)?;

        Some(MoenvAqi {
            station_name: station.sitename.clone(),
            aqi: parse_value(&station.aqi),
            status: station.status.clone(),
            pm2_5: parse_value(&station.pm2_5),
            pm10: parse_value(&station.pm10),
            o3: parse_value(&station.o3),
            no2: parse_value(&station.no2),
            so2: parse_value(&station.so2),
            co: parse_value(&station.co),
            published_at: station.publishtime.clone(),
            distance_km,
        })
    }
}

// Empty or malformed numeric strings count as 0, matching how the upstream
// reports pollutants that a station does not measure.
fn parse_value(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

fn station_position(station: &MoenvStation) -> Option<LatLon> {
    let lat: f64 = station.latitude.trim().parse().ok()?;
    let lon: f64 = station.longitude.trim().parse().ok()?;
    Some(LatLon(lat, lon))
}

fn sample_is_valid(station: &MoenvStation) -> bool {
    parse_value(&station.aqi) >= 0.0
}

async fn fetch_stations(http: Client, api_key: Option<String>) -> Result<Vec<MoenvStation>, ProviderError> {
    let key = api_key.ok_or(ProviderError::MissingKey)?;

    let response = http
        .get(DATA_URL)
        .query(&[
            ("api_key", key.as_str()),
            ("limit", FETCH_LIMIT),
            ("sort", "ImportDate desc"),
            ("format", "JSON"),
        ])
        .send()
        .await
        .map_err(|source| ProviderError::Network {
            url: DATA_URL.to_string(),
            source,
        })?;
    let response = ProviderError::from_status(DATA_URL, response)?;

    let body: MoenvResponse = response
        .json()
        .await
        .map_err(|source| ProviderError::Decode {
            url: DATA_URL.to_string(),
            source,
        })?;

    Ok(body.records)
}
