use serde::Deserialize;

use crate::board::Submission;
use crate::error::{BoardError, BoardResult, CsvSource};
use crate::roster::{has_header, read_table_str, CsvTable, EID_ALIASES, NAME_ALIASES, STATUS_ALIASES};
use crate::rules::ShiftKind;

/// Submission request from the board page. CSV files arrive as text.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub roster: Option<String>,
    #[serde(default)]
    pub swap: Option<String>,
    #[serde(default)]
    pub vet: Option<String>,
    #[serde(default)]
    pub labor_share: Option<String>,
    pub date: String,
    pub shift: String,
    #[serde(default)]
    pub site: String,
}

/// Checks the request before any CSV is parsed
pub fn validate_submission(req: &SubmitRequest) -> BoardResult<()> {
    let roster_given = req
        .roster
        .as_ref()
        .map(|text| !text.trim().is_empty())
        .unwrap_or(false);
    if !roster_given {
        return Err(BoardError::MissingRoster);
    }

    if req.date.trim().is_empty() {
        return Err(BoardError::InvalidSubmission("Date is required".to_string()));
    }

    req.shift
        .parse::<ShiftKind>()
        .map_err(BoardError::InvalidSubmission)?;

    Ok(())
}

/// Roster must carry at least the name, employee id and status columns.
/// Shared by the web form and the CLI.
pub fn check_roster_headers(table: &CsvTable) -> BoardResult<()> {
    let missing: Vec<&str> = [
        ("name", NAME_ALIASES),
        ("employee id", EID_ALIASES),
        ("status", STATUS_ALIASES),
    ]
    .iter()
    .filter(|(_, aliases)| !has_header(&table.headers, aliases))
    .map(|(label, _)| *label)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BoardError::InvalidSubmission(format!(
            "Roster is missing {} column(s). Detected headers: {}",
            missing.join(", "),
            table.headers.join(", ")
        )))
    }
}

fn optional_table(text: &Option<String>, source: CsvSource) -> BoardResult<CsvTable> {
    match text {
        Some(text) => read_table_str(text, source),
        None => Ok(CsvTable::default()),
    }
}

/// Validates the request and parses every CSV it carries
pub fn parse_submission(req: &SubmitRequest) -> BoardResult<Submission> {
    validate_submission(req)?;

    let roster = optional_table(&req.roster, CsvSource::Roster)?;
    check_roster_headers(&roster)?;

    let shift = req
        .shift
        .parse::<ShiftKind>()
        .map_err(BoardError::InvalidSubmission)?;

    Ok(Submission {
        roster,
        swaps: optional_table(&req.swap, CsvSource::Swap)?,
        vet_vto: optional_table(&req.vet, CsvSource::VetVto)?,
        labor_share: optional_table(&req.labor_share, CsvSource::LaborShare)?,
        date: req.date.clone(),
        shift,
        site: req.site.clone(),
    })
}
