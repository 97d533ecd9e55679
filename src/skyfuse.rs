//! The main entry point: a client that reconciles the global OpenWeatherMap
//! baseline with Taiwan's regional observation and air-quality networks.
//!
//! The global provider always supplies the baseline record; inside the Taiwan
//! bounding box the regional networks overlay their higher-fidelity readings
//! on top of it. Regional failures only ever remove their own contribution,
//! so a request succeeds whenever the baseline does.

use crate::error::SkyFuseError;
use crate::geo::{is_in_taiwan, LatLon};
use crate::providers::cwa::{CwaClient, CwaObservation};
use crate::providers::error::ProviderError;
use crate::providers::moenv::{MoenvAqi, MoenvClient};
use crate::providers::openweather::{default_city_names, OpenWeatherClient};
use crate::types::location::{contains_cjk, LocationInfo};
use crate::types::weather::{AirQuality, PollutantComponents, WeatherReport};
use bon::bon;
use log::debug;
use reqwest::Client;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Applied to every upstream call; the slowest acceptable answer for an
/// interactive weather lookup.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const OPENWEATHER_KEY_VAR: &str = "OPENWEATHER_API_KEY";
const CWA_KEY_VAR: &str = "CWA_API_KEY";
const MOENV_KEY_VAR: &str = "MOENV_API_KEY";

/// Weather aggregation client.
///
/// Construct with the builder, or [`SkyFuse::from_env`] to pick up
/// credentials from the environment. Every credential is optional: a missing
/// regional key silently disables that overlay, while a missing OpenWeatherMap
/// key makes weather queries fail with [`SkyFuseError::ApiKeyMissing`] since
/// no baseline exists without it.
///
/// ```no_run
/// # use skyfuse::{SkyFuse, SkyFuseError};
/// # async fn run() -> Result<(), SkyFuseError> {
/// let client = SkyFuse::builder()
///     .openweather_key("owm-key".to_string())
///     .cwa_key("cwa-key".to_string())
///     .build()?;
/// let report = client.weather_by_coordinates(25.033, 121.564).await?;
/// println!("{} {}°C ({})", report.location, report.temperature, report.source);
/// # Ok(())
/// # }
/// ```
pub struct SkyFuse {
    openweather: OpenWeatherClient,
    cwa: CwaClient,
    moenv: MoenvClient,
}

#[bon]
impl SkyFuse {
    /// Builds a client.
    ///
    /// # Arguments
    ///
    /// * `.openweather_key(String)`: Optional. Credential for the global provider.
    /// * `.cwa_key(String)`: Optional. Credential for the Taiwan observation network.
    /// * `.moenv_key(String)`: Optional. Credential for the Taiwan air-quality network.
    /// * `.city_names(HashMap<String, String>)`: Optional. English-to-localized
    ///   place-name table; defaults to the built-in Taiwan county/city table.
    /// * `.timeout(Duration)`: Optional. Per-request timeout on every upstream
    ///   call. Defaults to 10 seconds.
    #[builder]
    pub fn new(
        openweather_key: Option<String>,
        cwa_key: Option<String>,
        moenv_key: Option<String>,
        city_names: Option<HashMap<String, String>>,
        timeout: Option<Duration>,
    ) -> Result<Self, SkyFuseError> {
        let http = Client::builder()
            .timeout(timeout.unwrap_or(HTTP_TIMEOUT))
            .build()
            .map_err(SkyFuseError::Init)?;
        let city_names = city_names.unwrap_or_else(default_city_names);
        Ok(Self {
            openweather: OpenWeatherClient::new(openweather_key, city_names, http.clone()),
            cwa: CwaClient::new(cwa_key, http.clone()),
            moenv: MoenvClient::new(moenv_key, http),
        })
    }

    /// Builds a client from the `OPENWEATHER_API_KEY`, `CWA_API_KEY` and
    /// `MOENV_API_KEY` environment variables; unset variables leave the
    /// corresponding source unconfigured.
    pub fn from_env() -> Result<Self, SkyFuseError> {
        Self::builder()
            .maybe_openweather_key(env::var(OPENWEATHER_KEY_VAR).ok())
            .maybe_cwa_key(env::var(CWA_KEY_VAR).ok())
            .maybe_moenv_key(env::var(MOENV_KEY_VAR).ok())
            .build()
    }

    /// Forward geocoding: resolves a free-text query into candidate places,
    /// Taiwan entries first.
    pub async fn search_locations(&self, query: &str) -> Result<Vec<LocationInfo>, SkyFuseError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SkyFuseError::InvalidRequest(
                "search query must not be empty".to_string(),
            ));
        }
        self.openweather.search(query).await.map_err(|e| match e {
            ProviderError::MissingKey => SkyFuseError::ApiKeyMissing,
            other => SkyFuseError::Search(other),
        })
    }

    /// Current conditions for a named city, enriched with regional data when
    /// the provider resolves it to a coordinate inside Taiwan.
    pub async fn weather_by_city(&self, city: &str) -> Result<WeatherReport, SkyFuseError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(SkyFuseError::InvalidRequest(
                "city must not be empty".to_string(),
            ));
        }

        let (report, coord) = self
            .openweather
            .current_by_city(city)
            .await
            .map_err(|e| SkyFuseError::from_fetch(e, Some(city)))?;

        match coord {
            Some(at) => Ok(self.enrich(report, at).await),
            None => Ok(report),
        }
    }

    /// Current conditions for a coordinate, enriched with regional data when
    /// it falls inside Taiwan.
    pub async fn weather_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherReport, SkyFuseError> {
        let at = LatLon(lat, lon);
        if !at.is_valid() {
            return Err(SkyFuseError::InvalidCoordinates { lat, lon });
        }

        let report = self
            .openweather
            .current_by_coords(at)
            .await
            .map_err(|e| SkyFuseError::from_fetch(e, None))?;

        Ok(self.enrich(report, at).await)
    }

    /// Overlays regional data onto the baseline record.
    ///
    /// Inside Taiwan the two regional lookups run concurrently and fail
    /// independently; each success overwrites its fields and appends a
    /// station-qualified provenance label. Outside Taiwan (or when the
    /// regional air-quality network has nothing) the global air-pollution
    /// endpoint fills in the air quality.
    async fn enrich(&self, mut report: WeatherReport, at: LatLon) -> WeatherReport {
        let mut sources = vec![report.source.clone()];

        if let Some(info) = self.openweather.reverse_geocode(at).await {
            report.location = info.name;
            report.city = info.state;
        }

        if is_in_taiwan(at) {
            merge_location_names(&mut report);

            let (observation, aqi) =
                tokio::join!(self.cwa.nearest_observation(at), self.moenv.nearest_aqi(at));
            overlay_regional(&mut report, observation, aqi, &mut sources);
        }

        if report.air_quality.is_none() {
            fill_air_quality(&mut report, self.openweather.air_quality(at).await);
        }

        report.source = sources.join(", ");
        report
    }
}

/// Fills the air quality from the global provider's sample when no regional
/// sample made it onto the record; never overwrites an existing one.
fn fill_air_quality(report: &mut WeatherReport, global: Option<AirQuality>) {
    if report.air_quality.is_none() {
        report.air_quality = global;
    }
}

/// Applies whichever regional results arrived, in fixed order: observation
/// first, then air quality, each appending its station-qualified label.
fn overlay_regional(
    report: &mut WeatherReport,
    observation: Option<CwaObservation>,
    aqi: Option<MoenvAqi>,
    sources: &mut Vec<String>,
) {
    if let Some(obs) = observation {
        debug!(
            "applying CWA reading from {} ({:.1} km away)",
            obs.station_name, obs.distance_km
        );
        apply_observation(report, &obs);
        sources.push(format!("中央氣象署({})", obs.station_name));
    }

    if let Some(sample) = aqi {
        debug!(
            "applying MOENV sample from {} ({:.1} km away)",
            sample.station_name, sample.distance_km
        );
        report.air_quality = Some(air_quality_from_moenv(&sample));
        sources.push(format!("環境部({})", sample.station_name));
    }
}

// County + district concatenation, e.g. "臺北市" + "信義區" -> "臺北市信義區".
// Only applies when both names are already in Chinese script.
fn merge_location_names(report: &mut WeatherReport) {
    let Some(city) = report.city.clone() else {
        return;
    };
    if city.is_empty() || report.location.is_empty() {
        return;
    }
    if contains_cjk(&report.location) && contains_cjk(&city) && !report.location.starts_with(&city)
    {
        report.location = format!("{city}{}", report.location);
        report.city = None;
    }
}

fn apply_observation(report: &mut WeatherReport, obs: &CwaObservation) {
    report.temperature = obs.temperature;
    report.humidity = obs.humidity;
    report.wind_speed = (obs.wind_speed_ms * 3.6).round();
    // Automatic stations carry no apparent-temperature model.
    report.feels_like = obs.temperature;
}

/// Maps the MOENV 0–500 AQI onto the 1–5 ordinal used across the system.
pub(crate) fn normalize_moenv_aqi(raw: f64) -> u8 {
    if raw <= 50.0 {
        1
    } else if raw <= 100.0 {
        2
    } else if raw <= 150.0 {
        3
    } else if raw <= 200.0 {
        4
    } else {
        5
    }
}

fn air_quality_from_moenv(sample: &MoenvAqi) -> AirQuality {
    AirQuality {
        aqi: normalize_moenv_aqi(sample.aqi),
        description: sample.status.clone(),
        components: PollutantComponents {
            co: sample.co,
            // NO and NH3 are not reported by this network.
            no: 0.0,
            no2: sample.no2,
            o3: sample.o3,
            so2: sample.so2,
            pm2_5: sample.pm2_5,
            pm10: sample.pm10,
            nh3: 0.0,
        },
    }
}
