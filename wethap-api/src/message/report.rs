use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Reading frame written by a sender: `{"info": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingReport {
    pub info: Info,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// Room label the reading was taken in
    #[serde(rename = "labID")]
    pub lab_id: String,
    /// Local date, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Local time, `HH:MM:SS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Schedule position; absent for manual readings
    #[serde(rename = "numGen", default, skip_serializing_if = "Option::is_none")]
    pub num_gen: Option<u32>,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Pressure in hPa
    pub pressure: f64,
}

impl Info {
    /// Whether this reading answers a scheduled request.
    pub fn is_scheduled(&self) -> bool {
        self.num_gen.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_report_has_no_num_gen() {
        let report: ReadingReport = serde_json::from_str(
            r#"{"info": {"labID": "T4", "temperature": 21.5, "humidity": 40.0, "pressure": 1013.2}}"#,
        )
        .unwrap();

        assert!(!report.info.is_scheduled());
        assert_eq!(report.info.date, None);
    }

    #[test]
    fn test_scheduled_report_round_trip_names() {
        let report = ReadingReport {
            info: Info {
                lab_id: "T4".into(),
                date: Some("2024-05-01".into()),
                time: Some("09:25:00".into()),
                num_gen: Some(1),
                temperature: 21.5,
                humidity: 40.0,
                pressure: 1013.2,
            },
        };
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["info"]["numGen"], 1);
        assert_eq!(value["info"]["labID"], "T4");
    }

    #[test]
    fn test_report_missing_measurement_rejected() {
        let result = serde_json::from_str::<ReadingReport>(
            r#"{"info": {"labID": "T4", "temperature": 21.5, "humidity": 40.0}}"#,
        );
        assert!(result.is_err());
    }
}
