use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::board::HeadcountSummary;
use crate::rules::ShiftKind;

/// Downloadable summary of the current board
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub date: String,
    pub day: String,
    pub shift: ShiftKind,
    pub site: String,
    pub shift_type: String,
    #[serde(rename = "plannedHC")]
    pub planned_hc: i64,
    #[serde(rename = "actualHC")]
    pub actual_hc: usize,
    pub timestamp: String,
}

impl ExportSummary {
    pub fn new(summary: &HeadcountSummary, at: DateTime<Utc>) -> Self {
        ExportSummary {
            date: summary.date.clone(),
            day: summary.day.clone(),
            shift: summary.shift,
            site: summary.site.clone(),
            shift_type: summary.shift_type.clone(),
            planned_hc: summary.planned_hc,
            actual_hc: summary.actual_hc,
            timestamp: at.to_rfc3339(),
        }
    }

    /// `labor-board-<date>.json`, with `NA` when no date was entered
    pub fn file_name(&self) -> String {
        let date: String = self
            .date
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
            .collect();
        if date.is_empty() {
            "labor-board-NA.json".to_string()
        } else {
            format!("labor-board-{}.json", date)
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
