//! Sensor records
//!
//! `SensorRecord` is what the frame decoder produces, `ScoredRecord` is what
//! the inference engine produces. Both are immutable values; the pipeline
//! shares them behind `Arc` instead of mutating them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::layout::{FEATURE_COUNT, GAS, HUMIDITY, TEMPERATURE};

/// Wall-clock timestamp format used by the API and the CSV log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One decoded sensor sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "Gas")]
    pub gas: i64,
}

impl SensorRecord {
    pub fn new(temperature: f64, humidity: f64, gas: i64) -> Self {
        Self { temperature, humidity, gas }
    }

    /// Feature vector in FEATURE_LAYOUT order.
    ///
    /// The only place a record becomes a positional vector.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        let mut values = [0.0; FEATURE_COUNT];
        values[TEMPERATURE] = self.temperature;
        values[HUMIDITY] = self.humidity;
        values[GAS] = self.gas as f64;
        values
    }
}

/// A sensor sample plus the model decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub reading: SensorRecord,

    /// Serialized as 0/1, the same encoding as the CSV column
    #[serde(rename = "Anomaly", with = "anomaly_flag")]
    pub anomaly: bool,

    /// P(anomaly) for supervised models, decision value for outlier detectors
    #[serde(rename = "Score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(rename = "Timestamp", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
}

impl ScoredRecord {
    /// Everything except the timestamp
    pub fn same_decision(&self, other: &ScoredRecord) -> bool {
        self.reading == other.reading && self.anomaly == other.anomaly && self.score == other.score
    }
}

pub(crate) mod anomaly_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*flag))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u8),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Int(0) => Ok(false),
            Flag::Int(1) => Ok(true),
            Flag::Int(n) => Err(serde::de::Error::custom(format!("invalid anomaly flag {}", n))),
        }
    }
}

pub(crate) mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 5)
            .unwrap()
    }

    #[test]
    fn test_features_follow_layout() {
        let record = SensorRecord::new(25.5, 60.0, 100);
        assert_eq!(record.features(), [25.5, 60.0, 100.0]);
    }

    #[test]
    fn test_scored_record_json_shape() {
        let scored = ScoredRecord {
            reading: SensorRecord::new(40.0, 20.0, 350),
            anomaly: true,
            score: Some(0.9),
            timestamp: ts(),
        };

        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["Temperature"], 40.0);
        assert_eq!(json["Humidity"], 20.0);
        assert_eq!(json["Gas"], 350);
        assert_eq!(json["Anomaly"], 1);
        assert_eq!(json["Score"], 0.9);
        assert_eq!(json["Timestamp"], "2026-03-01 12:30:05");

        let back: ScoredRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, scored);
    }

    #[test]
    fn test_score_omitted_when_absent() {
        let scored = ScoredRecord {
            reading: SensorRecord::new(25.0, 60.0, 100),
            anomaly: false,
            score: None,
            timestamp: ts(),
        };
        let json = serde_json::to_value(&scored).unwrap();
        assert!(json.get("Score").is_none());
        assert_eq!(json["Anomaly"], 0);
    }

    #[test]
    fn test_same_decision_ignores_timestamp() {
        let a = ScoredRecord {
            reading: SensorRecord::new(25.0, 60.0, 100),
            anomaly: false,
            score: Some(0.1),
            timestamp: ts(),
        };
        let mut b = a.clone();
        b.timestamp = ts() + chrono::Duration::seconds(3);
        assert!(a.same_decision(&b));

        b.anomaly = true;
        assert!(!a.same_decision(&b));
    }
}
