//! One row of the append log

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::logic::features::layout::FEATURE_LAYOUT;
use crate::logic::features::record::{anomaly_flag, timestamp_format};
use crate::logic::features::{SensorRecord, TIMESTAMP_FORMAT};

pub const TIMESTAMP_COLUMN: &str = "Timestamp";
pub const ANOMALY_COLUMN: &str = "Anomaly";

/// Column names: timestamp, the feature layout, then the decision
pub fn header() -> Vec<&'static str> {
    let mut columns = Vec::with_capacity(FEATURE_LAYOUT.len() + 2);
    columns.push(TIMESTAMP_COLUMN);
    columns.extend_from_slice(FEATURE_LAYOUT);
    columns.push(ANOMALY_COLUMN);
    columns
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    #[serde(rename = "Timestamp", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    #[serde(flatten)]
    pub reading: SensorRecord,
    #[serde(rename = "Anomaly", with = "anomaly_flag")]
    pub anomaly: bool,
}

impl LogEntry {
    /// Dedup key: everything but the timestamp
    pub fn same_values(&self, reading: &SensorRecord, anomaly: bool) -> bool {
        self.reading == *reading && self.anomaly == anomaly
    }

    pub(crate) fn to_row(&self) -> [String; 5] {
        [
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format_float(self.reading.temperature),
            format_float(self.reading.humidity),
            self.reading.gas.to_string(),
            u8::from(self.anomaly).to_string(),
        ]
    }

    pub(crate) fn from_row(row: &csv::StringRecord) -> Result<Self, String> {
        if row.len() != 5 {
            return Err(format!("expected 5 columns, found {}", row.len()));
        }

        let field = |i: usize| row.get(i).unwrap_or_default().trim();

        let timestamp = NaiveDateTime::parse_from_str(field(0), TIMESTAMP_FORMAT)
            .map_err(|e| format!("timestamp {:?}: {}", field(0), e))?;
        let temperature = parse_float(field(1))?;
        let humidity = parse_float(field(2))?;
        let gas = field(3)
            .parse::<i64>()
            .map_err(|_| format!("gas {:?} is not an integer", field(3)))?;
        let anomaly = match field(4) {
            "0" => false,
            "1" => true,
            other => return Err(format!("anomaly {:?} is not 0/1", other)),
        };

        Ok(Self {
            timestamp,
            reading: SensorRecord::new(temperature, humidity, gas),
            anomaly,
        })
    }
}

/// Shortest round-trip form, always with a decimal point (`25.0`)
fn format_float(v: f64) -> String {
    format!("{:?}", v)
}

fn parse_float(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{:?} is not a number", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_header_follows_layout() {
        assert_eq!(header(), vec!["Timestamp", "Temperature", "Humidity", "Gas", "Anomaly"]);
    }

    #[test]
    fn test_row_format() {
        let entry = LogEntry {
            timestamp: NaiveDate::from_ymd_opt(2026, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
            reading: SensorRecord::new(25.0, 60.5, 100),
            anomaly: true,
        };
        assert_eq!(entry.to_row(), ["2026-01-02 03:04:05", "25.0", "60.5", "100", "1"]);

        let row = csv::StringRecord::from(entry.to_row().to_vec());
        assert_eq!(LogEntry::from_row(&row).unwrap(), entry);
    }

    #[test]
    fn test_from_row_rejects_bad_values() {
        for fields in [
            vec!["2026-01-02 03:04:05", "abc", "60.0", "100", "0"],
            vec!["2026-01-02 03:04:05", "25.0", "60.0", "100", "2"],
            vec!["yesterday", "25.0", "60.0", "100", "0"],
            vec!["2026-01-02 03:04:05", "25.0", "60.0"],
        ] {
            let row = csv::StringRecord::from(fields);
            assert!(LogEntry::from_row(&row).is_err());
        }
    }
}
