mod error;
mod geo;
mod providers;
mod score;
mod skyfuse;
mod stations;
mod types;

pub use error::{kind, SkyFuseError};
pub use skyfuse::*;

pub use geo::{distance_km, is_in_taiwan, LatLon};
pub use score::{score_conditions, score_running_condition, RunningCategory, RunningSuitability};

pub use providers::cwa::CwaObservation;
pub use providers::error::ProviderError;
pub use providers::moenv::MoenvAqi;
pub use providers::openweather::{default_city_names, weather_icon_url};

pub use types::location::LocationInfo;
pub use types::weather::{aqi_level_description, AirQuality, PollutantComponents, WeatherReport};
