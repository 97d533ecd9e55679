//! Running-suitability scoring, derived from a reconciled weather record.
//!
//! Pure arithmetic over four dimensions. Each dimension deducts at most one
//! band from a starting score of 100; deductions across dimensions are
//! independent and additive.

use crate::types::weather::WeatherReport;
use serde::{Deserialize, Serialize};

/// Suitability band for the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunningCategory {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl RunningCategory {
    fn from_score(score: u8) -> Self {
        match score {
            80..=100 => RunningCategory::Excellent,
            60..=79 => RunningCategory::Good,
            40..=59 => RunningCategory::Fair,
            _ => RunningCategory::Poor,
        }
    }

    /// Localized display label for the band.
    pub fn label(&self) -> &'static str {
        match self {
            RunningCategory::Excellent => "絕佳",
            RunningCategory::Good => "良好",
            RunningCategory::Fair => "尚可",
            RunningCategory::Poor => "不佳",
        }
    }
}

/// The derived suitability view of one weather record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningSuitability {
    /// 0–100, higher is better.
    pub score: u8,
    pub category: RunningCategory,
    /// Conditions that cost points, in evaluation order (temperature, air
    /// quality, humidity, wind).
    pub concerns: Vec<String>,
}

/// Scores a reconciled record for running.
pub fn score_running_condition(record: &WeatherReport) -> RunningSuitability {
    score_conditions(
        record.temperature,
        record.air_quality.as_ref().map(|aq| aq.aqi),
        record.humidity,
        record.wind_speed,
    )
}

/// Scores raw condition values: temperature in °C, AQI on the 1–5 ordinal
/// when known, humidity in %, wind speed in km/h.
pub fn score_conditions(
    temperature: f64,
    aqi: Option<u8>,
    humidity: f64,
    wind_speed: f64,
) -> RunningSuitability {
    let mut score: i32 = 100;
    let mut concerns = Vec::new();

    if temperature < 5.0 {
        score -= 30;
        concerns.push("氣溫過低".to_string());
    } else if temperature < 10.0 {
        score -= 15;
        concerns.push("氣溫偏低".to_string());
    } else if temperature > 28.0 {
        score -= 30;
        concerns.push("氣溫過高".to_string());
    } else if temperature > 23.0 {
        score -= 15;
        concerns.push("氣溫偏高".to_string());
    }

    match aqi {
        Some(level) if level >= 4 => {
            score -= 40;
            concerns.push("空氣品質差".to_string());
        }
        Some(3) => {
            score -= 25;
            concerns.push("空氣品質普通".to_string());
        }
        Some(2) => score -= 10,
        _ => {}
    }

    if humidity > 80.0 {
        score -= 20;
        concerns.push("濕度過高".to_string());
    } else if humidity > 70.0 {
        score -= 10;
        concerns.push("濕度偏高".to_string());
    }

    if wind_speed > 30.0 {
        score -= 15;
        concerns.push("風速過強".to_string());
    } else if wind_speed > 20.0 {
        score -= 8;
    }

    let score = score.clamp(0, 100) as u8;
    RunningSuitability {
        score,
        category: RunningCategory::from_score(score),
        concerns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ideal_conditions_score_perfect() {
        let s = score_conditions(15.0, Some(1), 50.0, 5.0);
        assert_eq!(s.score, 100);
        assert_eq!(s.category, RunningCategory::Excellent);
        assert!(s.concerns.is_empty());
    }

    #[test]
    fn hot_humid_polluted_day_is_poor() {
        // 30 + 40 + 20 deducted, wind is harmless.
        let s = score_conditions(30.0, Some(4), 85.0, 10.0);
        assert_eq!(s.score, 10);
        assert_eq!(s.category, RunningCategory::Poor);
        assert_eq!(s.concerns, ["氣溫過高", "空氣品質差", "濕度過高"]);
    }

    #[test]
    fn score_floors_at_zero() {
        let s = score_conditions(-10.0, Some(5), 95.0, 40.0);
        assert_eq!(s.score, 0);
        assert_eq!(s.category, RunningCategory::Poor);
    }

    #[test]
    fn unknown_aqi_deducts_nothing() {
        let s = score_conditions(15.0, None, 50.0, 5.0);
        assert_eq!(s.score, 100);
    }

    #[test]
    fn moderate_bands_deduct_without_flagging() {
        // AQI 2 and wind 25 km/h cost points but raise no concern.
        let s = score_conditions(15.0, Some(2), 50.0, 25.0);
        assert_eq!(s.score, 82);
        assert!(s.concerns.is_empty());
    }

    #[test]
    fn band_edges() {
        assert!(score_conditions(5.0, None, 50.0, 5.0).concerns.contains(&"氣溫偏低".to_string()));
        assert!(score_conditions(23.0, None, 50.0, 5.0).concerns.is_empty());
        assert!(score_conditions(15.0, None, 70.0, 5.0).concerns.is_empty());
        assert_eq!(score_conditions(15.0, None, 50.0, 20.0).score, 100);
    }

    #[test]
    fn category_bands() {
        assert_eq!(RunningCategory::from_score(80), RunningCategory::Excellent);
        assert_eq!(RunningCategory::from_score(79), RunningCategory::Good);
        assert_eq!(RunningCategory::from_score(60), RunningCategory::Good);
        assert_eq!(RunningCategory::from_score(59), RunningCategory::Fair);
        assert_eq!(RunningCategory::from_score(40), RunningCategory::Fair);
        assert_eq!(RunningCategory::from_score(39), RunningCategory::Poor);
    }

    #[test]
    fn labels_match_categories() {
        assert_eq!(RunningCategory::Excellent.label(), "絕佳");
        assert_eq!(RunningCategory::Poor.label(), "不佳");
    }

    #[test]
    fn scores_from_record() {
        use crate::types::weather::{aqi_level_description, AirQuality, PollutantComponents, WeatherReport};
        let record = WeatherReport {
            location: "臺北市".to_string(),
            city: None,
            temperature: 26.0,
            description: "多雲".to_string(),
            humidity: 75.0,
            wind_speed: 11.0,
            icon: "04d".to_string(),
            feels_like: 26.0,
            pressure: 1012.0,
            visibility: 10.0,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            source: "OpenWeatherMap".to_string(),
            air_quality: Some(AirQuality {
                aqi: 2,
                description: aqi_level_description(2).to_string(),
                components: PollutantComponents::default(),
            }),
        };
        let s = score_running_condition(&record);
        // 15 (slightly hot) + 10 (AQI 2) + 10 (slightly humid)
        assert_eq!(s.score, 65);
        assert_eq!(s.category, RunningCategory::Good);
        assert_eq!(s.concerns, ["氣溫偏高", "濕度偏高"]);
    }
}
