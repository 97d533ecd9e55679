use thiserror::Error;

/// Errors produced at an upstream-provider boundary.
///
/// The regional adapters (CWA, MOENV) log these and degrade to "no
/// contribution"; only the primary provider surfaces them past the
/// aggregator, converted into [`crate::SkyFuseError`].
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API credential not configured")]
    MissingKey,

    #[error("Network request failed for {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Resource not found at {url}")]
    NotFound { url: String },

    #[error("Upstream reported failure for {url}: {detail}")]
    UpstreamFailure { url: String, detail: String },

    #[error("Failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ProviderError {
    /// Maps a non-success response into the matching variant, keeping the
    /// request URL for diagnostics.
    pub(crate) fn from_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        match response.error_for_status() {
            Ok(resp) => Ok(resp),
            Err(_) if status == reqwest::StatusCode::NOT_FOUND => Err(ProviderError::NotFound {
                url: url.to_string(),
            }),
            Err(source) => Err(ProviderError::HttpStatus {
                url: url.to_string(),
                status,
                source,
            }),
        }
    }
}
