use crate::providers::error::ProviderError;
use thiserror::Error;

/// Machine-readable error kinds, stable across releases. Callers that serve
/// this library over an API can map them straight onto response codes.
pub mod kind {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const API_KEY_MISSING: &str = "API_KEY_MISSING";
    pub const CITY_NOT_FOUND: &str = "CITY_NOT_FOUND";
    pub const INVALID_COORDINATES: &str = "INVALID_COORDINATES";
    pub const FETCH_ERROR: &str = "FETCH_ERROR";
    pub const SEARCH_ERROR: &str = "SEARCH_ERROR";
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
}

#[derive(Debug, Error)]
pub enum SkyFuseError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("OpenWeatherMap API key not configured")]
    ApiKeyMissing,

    #[error("City not found: {city}")]
    CityNotFound { city: String },

    #[error("Coordinates out of range: lat {lat}, lon {lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Failed to fetch weather data")]
    Fetch(#[source] ProviderError),

    #[error("Location search failed")]
    Search(#[source] ProviderError),

    #[error("Failed to initialize HTTP client")]
    Init(#[source] reqwest::Error),
}

impl SkyFuseError {
    /// The stable kind string for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            SkyFuseError::InvalidRequest(_) => kind::INVALID_REQUEST,
            SkyFuseError::ApiKeyMissing => kind::API_KEY_MISSING,
            SkyFuseError::CityNotFound { .. } => kind::CITY_NOT_FOUND,
            SkyFuseError::InvalidCoordinates { .. } => kind::INVALID_COORDINATES,
            SkyFuseError::Fetch(_) => kind::FETCH_ERROR,
            SkyFuseError::Search(_) => kind::SEARCH_ERROR,
            SkyFuseError::Init(_) => kind::SERVER_ERROR,
        }
    }

    /// Converts a primary-provider failure into the public error for a
    /// weather fetch. `city` names the query for the not-found case; a 404
    /// on a coordinate lookup stays a fetch error.
    pub(crate) fn from_fetch(source: ProviderError, city: Option<&str>) -> Self {
        match (source, city) {
            (ProviderError::MissingKey, _) => SkyFuseError::ApiKeyMissing,
            (ProviderError::NotFound { .. }, Some(city)) => SkyFuseError::CityNotFound {
                city: city.to_string(),
            },
            (other, _) => SkyFuseError::Fetch(other),
        }
    }
}
