//! Geocoding results and place-name helpers.

use serde::{Deserialize, Serialize};

/// A resolved place from forward or reverse geocoding.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LocationInfo {
    pub name: String,
    /// Admin-1 region (county/city in Taiwan, state elsewhere).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

/// Whether the text contains at least one CJK unified ideograph.
///
/// Gates both the English-to-Chinese place-name translation and the
/// county + district concatenation rule, which only make sense when both
/// parts are already in Chinese script.
pub(crate) fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c))
}
