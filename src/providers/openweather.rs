//! OpenWeatherMap: baseline current conditions, forward/reverse geocoding and
//! fallback air quality.
//!
//! This is the only provider that must succeed for a request to succeed; the
//! regional networks are strictly additive overlays on top of its record.

use crate::geo::LatLon;
use crate::providers::error::ProviderError;
use crate::types::location::{contains_cjk, LocationInfo};
use crate::types::weather::{aqi_level_description, AirQuality, PollutantComponents, WeatherReport};
use chrono::{SecondsFormat, Utc};
use log::warn;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

const WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const AIR_POLLUTION_URL: &str = "https://api.openweathermap.org/data/2.5/air_pollution";
const GEO_DIRECT_URL: &str = "http://api.openweathermap.org/geo/1.0/direct";
const GEO_REVERSE_URL: &str = "http://api.openweathermap.org/geo/1.0/reverse";

/// Provenance label contributed by this provider.
pub(crate) const SOURCE_LABEL: &str = "OpenWeatherMap";

/// Geocoding results from mainland China are dropped from searches.
const EXCLUDED_COUNTRY: &str = "CN";
/// Domestic results sort ahead of everything else.
const DOMESTIC_COUNTRY: &str = "TW";

/// URL of the weather icon for an OpenWeatherMap icon code.
pub fn weather_icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

/// County/city-level translations for names the geocoder only returns in
/// English. Injectable through the client builder to keep the adapter
/// testable against other locales.
pub fn default_city_names() -> HashMap<String, String> {
    [
        ("Taipei City", "臺北市"),
        ("Taipei", "臺北市"),
        ("New Taipei City", "新北市"),
        ("New Taipei", "新北市"),
        ("Taoyuan City", "桃園市"),
        ("Taoyuan", "桃園市"),
        ("Taichung City", "臺中市"),
        ("Taichung", "臺中市"),
        ("Tainan City", "臺南市"),
        ("Tainan", "臺南市"),
        ("Kaohsiung City", "高雄市"),
        ("Kaohsiung", "高雄市"),
        ("Keelung City", "基隆市"),
        ("Keelung", "基隆市"),
        ("Hsinchu City", "新竹市"),
        ("Hsinchu", "新竹市"),
        ("Chiayi City", "嘉義市"),
        ("Chiayi", "嘉義市"),
        ("Hsinchu County", "新竹縣"),
        ("Miaoli County", "苗栗縣"),
        ("Miaoli", "苗栗縣"),
        ("Changhua County", "彰化縣"),
        ("Changhua", "彰化縣"),
        ("Nantou County", "南投縣"),
        ("Nantou", "南投縣"),
        ("Yunlin County", "雲林縣"),
        ("Yunlin", "雲林縣"),
        ("Chiayi County", "嘉義縣"),
        ("Pingtung County", "屏東縣"),
        ("Pingtung", "屏東縣"),
        ("Yilan County", "宜蘭縣"),
        ("Yilan", "宜蘭縣"),
        ("Hualien County", "花蓮縣"),
        ("Hualien", "花蓮縣"),
        ("Taitung County", "臺東縣"),
        ("Taitung", "臺東縣"),
        ("Penghu County", "澎湖縣"),
        ("Penghu", "澎湖縣"),
        ("Kinmen County", "金門縣"),
        ("Kinmen", "金門縣"),
        ("Lienchiang County", "連江縣"),
        ("Lienchiang", "連江縣"),
    ]
    .into_iter()
    .map(|(en, zh)| (en.to_string(), zh.to_string()))
    .collect()
}

// --- Wire format ---

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    coord: Option<Coord>,
    #[serde(default)]
    name: String,
    main: MainInfo,
    #[serde(default)]
    weather: Vec<ConditionInfo>,
    #[serde(default)]
    wind: WindInfo,
    #[serde(default)]
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Coord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct MainInfo {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize, Default)]
struct ConditionInfo {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize, Default)]
struct WindInfo {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize, Clone)]
struct GeoEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    local_names: Option<HashMap<String, String>>,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AirPollutionResponse {
    #[serde(default)]
    list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct AirPollutionEntry {
    main: AirPollutionMain,
    #[serde(default)]
    components: PollutantComponents,
}

#[derive(Debug, Deserialize)]
struct AirPollutionMain {
    aqi: u8,
}

pub(crate) struct OpenWeatherClient {
    api_key: Option<String>,
    http: Client,
    city_names: HashMap<String, String>,
}

impl OpenWeatherClient {
    pub(crate) fn new(api_key: Option<String>, city_names: HashMap<String, String>, http: Client) -> Self {
        Self {
            api_key,
            http,
            city_names,
        }
    }

    fn require_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::MissingKey)
    }

    /// Current conditions by city name. Returns the baseline record plus the
    /// resolved coordinate (when the provider echoes one) for enrichment.
    pub(crate) async fn current_by_city(
        &self,
        city: &str,
    ) -> Result<(WeatherReport, Option<LatLon>), ProviderError> {
        let key = self.require_key()?;
        let data: CurrentResponse = self
            .get_json(WEATHER_URL, &[("q", city), ("appid", key), ("units", "metric"), ("lang", "zh_tw")])
            .await?;
        let coord = data.coord.as_ref().map(|c| LatLon(c.lat, c.lon));
        Ok((baseline_report(data), coord))
    }

    /// Current conditions by coordinate.
    pub(crate) async fn current_by_coords(&self, at: LatLon) -> Result<WeatherReport, ProviderError> {
        let key = self.require_key()?;
        let lat = at.0.to_string();
        let lon = at.1.to_string();
        let data: CurrentResponse = self
            .get_json(
                WEATHER_URL,
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("appid", key), ("units", "metric"), ("lang", "zh_tw")],
            )
            .await?;
        Ok(baseline_report(data))
    }

    /// Forward geocoding: a global search and a TW-scoped search run
    /// concurrently, then the results are merged, de-duplicated and sorted
    /// with domestic entries first.
    pub(crate) async fn search(&self, query: &str) -> Result<Vec<LocationInfo>, ProviderError> {
        self.require_key()?;

        let scoped = format!("{query},{DOMESTIC_COUNTRY}");
        let (tw, global) = tokio::join!(self.geo_direct(&scoped), self.geo_direct(query));
        let (tw, global) = (tw?, global?);

        Ok(merge_search_results(tw, global)
            .into_iter()
            .map(|entry| self.to_location_info(entry, true))
            .collect())
    }

    /// Best-effort localized place name for a coordinate. Failures degrade to
    /// `None`; they never fail the request.
    pub(crate) async fn reverse_geocode(&self, at: LatLon) -> Option<LocationInfo> {
        let key = self.require_key().ok()?;
        let lat = at.0.to_string();
        let lon = at.1.to_string();
        let entries: Vec<GeoEntry> = match self
            .get_json(
                GEO_REVERSE_URL,
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("limit", "1"), ("appid", key)],
            )
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!("reverse geocoding failed: {e}");
                return None;
            }
        };

        let entry = entries.into_iter().next()?;
        let info = self.to_location_info(entry, false);

        // A name identical to its region would display twice.
        if info.state.as_deref() == Some(info.name.as_str()) {
            return Some(LocationInfo {
                name: info.name,
                state: None,
                country: None,
                lat: None,
                lon: None,
            });
        }
        Some(info)
    }

    /// Fallback air quality; OpenWeatherMap already reports the 1–5 ordinal.
    pub(crate) async fn air_quality(&self, at: LatLon) -> Option<AirQuality> {
        let key = self.require_key().ok()?;
        let lat = at.0.to_string();
        let lon = at.1.to_string();
        let body: AirPollutionResponse = match self
            .get_json(
                AIR_POLLUTION_URL,
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("appid", key)],
            )
            .await
        {
            Ok(body) => body,
            Err(e) => {
                warn!("air quality lookup failed: {e}");
                return None;
            }
        };

        let entry = body.list.into_iter().next()?;
        Some(AirQuality {
            aqi: entry.main.aqi,
            description: aqi_level_description(entry.main.aqi).to_string(),
            components: entry.components,
        })
    }

    async fn geo_direct(&self, query: &str) -> Result<Vec<GeoEntry>, ProviderError> {
        let key = self.require_key()?;
        let response = self
            .http
            .get(GEO_DIRECT_URL)
            .query(&[("q", query), ("limit", "5"), ("appid", key)])
            .send()
            .await
            .map_err(|source| ProviderError::Network {
                url: GEO_DIRECT_URL.to_string(),
                source,
            })?;

        // A non-success geocoding response degrades that half of the search
        // to zero results instead of failing the whole operation.
        if !response.status().is_success() {
            warn!("geocoding request for {query:?} returned {}", response.status());
            return Ok(Vec::new());
        }

        response.json().await.map_err(|source| ProviderError::Decode {
            url: GEO_DIRECT_URL.to_string(),
            source,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| ProviderError::Network {
                url: url.to_string(),
                source,
            })?;
        let response = ProviderError::from_status(url, response)?;
        response.json().await.map_err(|source| ProviderError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn to_location_info(&self, entry: GeoEntry, with_coords: bool) -> LocationInfo {
        let name = self.resolve_display_name(&entry);
        let state = entry.state.map(|s| match self.city_names.get(&s) {
            Some(translated) => translated.clone(),
            None => s,
        });
        LocationInfo {
            name,
            state,
            country: entry.country,
            lat: with_coords.then_some(entry.lat),
            lon: with_coords.then_some(entry.lon),
        }
    }

    // Prefer the Traditional Chinese localization; otherwise run the English
    // name through the translation table.
    fn resolve_display_name(&self, entry: &GeoEntry) -> String {
        let local = entry
            .local_names
            .as_ref()
            .and_then(|names| {
                names
                    .get("zh_tw")
                    .or_else(|| names.get("zh-tw"))
                    .or_else(|| names.get("zh"))
            })
            .cloned()
            .unwrap_or_else(|| entry.name.clone());

        if !contains_cjk(&local) {
            if let Some(translated) = self.city_names.get(&local) {
                return translated.clone();
            }
            if let Some(translated) = self.city_names.get(&entry.name) {
                return translated.clone();
            }
        }
        local
    }
}

fn baseline_report(data: CurrentResponse) -> WeatherReport {
    let condition = data.weather.into_iter().next().unwrap_or_default();
    WeatherReport {
        location: data.name,
        city: None,
        temperature: data.main.temp.round(),
        description: condition.description,
        humidity: data.main.humidity,
        wind_speed: (data.wind.speed * 3.6).round(),
        icon: condition.icon,
        feels_like: data.main.feels_like.round(),
        pressure: data.main.pressure,
        visibility: (data.visibility.unwrap_or(0.0) / 1000.0).round(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        source: SOURCE_LABEL.to_string(),
        air_quality: None,
    }
}

/// Merges the TW-scoped and global geocoding results: domestic entries are
/// inserted first so they win coordinate-collision de-duplication (3 decimal
/// places, ~100 m), excluded-country entries are dropped, and the final order
/// puts domestic entries ahead of everything else, otherwise stable.
fn merge_search_results(tw: Vec<GeoEntry>, global: Vec<GeoEntry>) -> Vec<GeoEntry> {
    let mut seen = HashSet::new();
    let mut merged: Vec<GeoEntry> = Vec::new();

    for entry in tw.into_iter().chain(global) {
        if entry.country.as_deref() == Some(EXCLUDED_COUNTRY) {
            continue;
        }
        let key = format!("{:.3},{:.3}", entry.lat, entry.lon);
        if seen.insert(key) {
            merged.push(entry);
        }
    }

    merged.sort_by_key(|entry| entry.country.as_deref() != Some(DOMESTIC_COUNTRY));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, lat: f64, lon: f64, country: &str) -> GeoEntry {
        GeoEntry {
            name: name.to_string(),
            local_names: None,
            lat,
            lon,
            country: Some(country.to_string()),
            state: None,
        }
    }

    fn client_with_defaults() -> OpenWeatherClient {
        OpenWeatherClient::new(Some("k".to_string()), default_city_names(), Client::new())
    }

    #[test]
    fn baseline_converts_units_and_rounds() {
        let data = CurrentResponse {
            coord: Some(Coord { lat: 25.0, lon: 121.5 }),
            name: "Taipei".to_string(),
            main: MainInfo {
                temp: 26.4,
                feels_like: 28.6,
                humidity: 71.0,
                pressure: 1011.0,
            },
            weather: vec![ConditionInfo {
                description: "多雲".to_string(),
                icon: "04d".to_string(),
            }],
            wind: WindInfo { speed: 10.0 },
            visibility: Some(8000.0),
        };
        let report = baseline_report(data);
        assert_eq!(report.wind_speed, 36.0); // 10 m/s -> 36 km/h
        assert_eq!(report.visibility, 8.0); // 8000 m -> 8 km
        assert_eq!(report.temperature, 26.0);
        assert_eq!(report.feels_like, 29.0);
        assert_eq!(report.source, "OpenWeatherMap");
    }

    #[test]
    fn merge_drops_excluded_country() {
        let merged = merge_search_results(
            vec![entry("新店", 24.97, 121.54, "TW")],
            vec![entry("Xindian", 39.0, 116.0, "CN")],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].country.as_deref(), Some("TW"));
    }

    #[test]
    fn merge_dedups_on_rounded_coordinate_keeping_domestic_entry() {
        let merged = merge_search_results(
            vec![entry("臺北", 25.0374, 121.5637, "TW")],
            vec![entry("Taipei", 25.03742, 121.5637, "TW"), entry("Paris", 48.85, 2.35, "FR")],
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "臺北");
    }

    #[test]
    fn merge_sorts_domestic_first_stable() {
        let merged = merge_search_results(
            vec![],
            vec![
                entry("London", 51.5, -0.12, "GB"),
                entry("臺南", 22.99, 120.21, "TW"),
                entry("Boston", 42.36, -71.05, "US"),
            ],
        );
        let countries: Vec<_> = merged.iter().map(|e| e.country.as_deref().unwrap()).collect();
        assert_eq!(countries, ["TW", "GB", "US"]);
    }

    #[test]
    fn display_name_prefers_zh_tw_localization() {
        let client = client_with_defaults();
        let mut names = HashMap::new();
        names.insert("zh_tw".to_string(), "臺中市".to_string());
        names.insert("en".to_string(), "Taichung".to_string());
        let e = GeoEntry {
            local_names: Some(names),
            ..entry("Taichung", 24.14, 120.68, "TW")
        };
        assert_eq!(client.resolve_display_name(&e), "臺中市");
    }

    #[test]
    fn display_name_translates_english_county_names() {
        let client = client_with_defaults();
        let e = entry("Hualien County", 23.99, 121.60, "TW");
        assert_eq!(client.resolve_display_name(&e), "花蓮縣");
    }

    #[test]
    fn display_name_keeps_unknown_names() {
        let client = client_with_defaults();
        let e = entry("Reykjavik", 64.14, -21.94, "IS");
        assert_eq!(client.resolve_display_name(&e), "Reykjavik");
    }

    #[test]
    fn custom_translation_table_is_honored() {
        let mut table = HashMap::new();
        table.insert("Springfield".to_string(), "春田市".to_string());
        let client = OpenWeatherClient::new(Some("k".to_string()), table, Client::new());
        let e = entry("Springfield", 39.78, -89.65, "US");
        assert_eq!(client.resolve_display_name(&e), "春田市");
    }

    #[test]
    fn icon_url_embeds_code() {
        assert_eq!(
            weather_icon_url("04d"),
            "https://openweathermap.org/img/wn/04d@2x.png"
        );
    }

    #[tokio::test]
    async fn missing_key_is_reported_before_any_io() {
        let client = OpenWeatherClient::new(None, default_city_names(), Client::new());
        let err = client.current_by_city("Taipei").await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingKey));
        let err = client.search("Taipei").await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingKey));
        assert!(client.reverse_geocode(LatLon(25.0, 121.5)).await.is_none());
        assert!(client.air_quality(LatLon(25.0, 121.5)).await.is_none());
    }
}
