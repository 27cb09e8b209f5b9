use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult, CsvSource};
use crate::rules::{allowed_codes, ShiftKind};

/// One CSV row keyed by (trimmed) column header
pub type Row = HashMap<String, String>;

/// A parsed CSV file: headers in file order plus header-keyed rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl CsvTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Builds a table from literal rows, mostly useful in tests
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut headers: Vec<String> = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        headers.sort();
        CsvTable { headers, rows }
    }
}

/// Column header aliases per logical field, first non-empty alias wins
pub const NAME_ALIASES: &[&str] = &["Employee Name", "Name", "Full Name", "Associate Name"];
pub const EID_ALIASES: &[&str] = &["Employee ID", "Employee Id", "EID", "Person ID", "Associate ID", "ID"];
/// A bare "Shift" column usually holds "Day"/"Night", not a pattern, so it is not an alias
pub const SHIFT_PATTERN_ALIASES: &[&str] = &["Shift Pattern", "Schedule", "Shift Code"];
pub const BARCODE_ALIASES: &[&str] = &["Badge Barcode ID", "Barcode", "Badge ID", "Badge"];
pub const HANDLE_ALIASES: &[&str] = &["User ID", "Login", "Handle", "Username"];
pub const PHOTO_ALIASES: &[&str] = &["Photo", "Photo URL", "Badge Photo", "Image"];
pub const STATUS_ALIASES: &[&str] = &["Employee Status", "Status"];
pub const DEPARTMENT_ALIASES: &[&str] = &["Department ID", "Dept ID", "Department"];
pub const MANAGEMENT_AREA_ALIASES: &[&str] = &["Management Area ID", "Mgmt Area ID"];

/// Department ids that always belong to YHM2
const YHM2_DEPARTMENTS: &[&str] = &["1211010", "1211020", "1211030", "1211040", "1299010", "1299020"];
/// Department ids that always belong to YDD2
const YDD2_DEPARTMENTS: &[&str] = &["1211070", "1211080", "1299070"];
/// Shared department that is YDD2 only inside management area 22
const SHARED_DEPARTMENT: &str = "1211050";
const SHARED_MANAGEMENT_AREA: &str = "22";

/// Site a roster row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    #[serde(rename = "YHM2")]
    Yhm2,
    #[serde(rename = "YDD2")]
    Ydd2,
    Other,
}

impl Site {
    pub fn as_str(self) -> &'static str {
        match self {
            Site::Yhm2 => "YHM2",
            Site::Ydd2 => "YDD2",
            Site::Other => "Other",
        }
    }

    /// Parses the site selector; blank means "all sites"
    pub fn parse_filter(value: &str) -> Option<Site> {
        match value.trim().to_uppercase().as_str() {
            "YHM2" => Some(Site::Yhm2),
            "YDD2" => Some(Site::Ydd2),
            "OTHER" => Some(Site::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized person record produced by ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub eid: String,
    pub name: String,
    pub shift_code: String,
    pub site: Site,
    pub barcode: String,
    pub handle: String,
    pub photo: String,
}

/// User selections that drive the filter pipeline
#[derive(Debug, Clone)]
pub struct RosterFilter {
    pub date: Option<NaiveDate>,
    pub shift: ShiftKind,
    /// `None` keeps every site
    pub site: Option<Site>,
}

/// Aggregate problems surfaced to the planner. Individual dropped rows are
/// never reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestNotice {
    /// Nothing survived the active-status filter
    NoActiveRows { row_count: usize, headers: Vec<String> },
    /// Nothing survived the whole pipeline
    NoBadges,
}

impl fmt::Display for IngestNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestNotice::NoActiveRows { row_count, headers } => write!(
                f,
                "No active rows found in {} roster rows. Detected headers: {}",
                row_count,
                headers.join(", ")
            ),
            IngestNotice::NoBadges => {
                f.write_str("No badges matched the selected date, shift and site")
            }
        }
    }
}

/// Result of running the filter pipeline
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub people: Vec<Person>,
    pub total_rows: usize,
    pub active_rows: usize,
    pub notices: Vec<IngestNotice>,
}

/// Reads CSV data into a header-keyed table. Empty input yields an empty table.
pub fn read_table<R: Read>(reader: R, source: CsvSource) -> BoardResult<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| BoardError::Csv { source_file: source, source: e })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| BoardError::Csv { source_file: source, source: e })?;

        // Blank lines at the end of exported files come through as one empty field
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (header.clone(), record.get(idx).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }

    Ok(CsvTable { headers, rows })
}

/// Reads a CSV table from a string; blank text is an empty table
pub fn read_table_str(text: &str, source: CsvSource) -> BoardResult<CsvTable> {
    if text.trim().is_empty() {
        return Ok(CsvTable::default());
    }
    read_table(text.as_bytes(), source)
}

pub fn read_table_path<P: AsRef<Path>>(path: P, source: CsvSource) -> BoardResult<CsvTable> {
    let text = std::fs::read_to_string(path)?;
    read_table_str(&text, source)
}

/// Resolves a logical field through its alias list
pub fn field<'a>(row: &'a Row, aliases: &[&str]) -> &'a str {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

/// True when at least one alias of the field appears as a header
pub fn has_header(headers: &[String], aliases: &[&str]) -> bool {
    headers.iter().any(|h| aliases.contains(&h.as_str()))
}

/// Parses the planning date from either `dd/mm/yyyy` or `yyyy-mm-dd`.
/// Anything else goes through a few common fallback formats.
pub fn parse_input_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(date) = parse_dmy(value) {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    // Generic fallback, may still fail
    const FALLBACK_FORMATS: &[&str] = &["%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y", "%B %d, %Y", "%b %d %Y"];
    FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn parse_dmy(value: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = value.split('/').collect();
    if parts.len() != 3 || parts[2].len() != 4 {
        return None;
    }
    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Site of a roster row, from its department and management area
pub fn classify_site(row: &Row) -> Site {
    let department = field(row, DEPARTMENT_ALIASES);
    // Spreadsheet exports sometimes render ids as floats
    let department = department.strip_suffix(".0").unwrap_or(department);

    if YHM2_DEPARTMENTS.contains(&department) {
        return Site::Yhm2;
    }
    if YDD2_DEPARTMENTS.contains(&department) {
        return Site::Ydd2;
    }
    if department == SHARED_DEPARTMENT {
        let area = field(row, MANAGEMENT_AREA_ALIASES);
        let area = area.strip_suffix(".0").unwrap_or(area);
        if area == SHARED_MANAGEMENT_AREA {
            return Site::Ydd2;
        }
    }
    Site::Other
}

/// Two-letter uppercase shift code from a shift pattern value
pub fn shift_code_of(value: &str) -> String {
    value.trim().chars().take(2).collect::<String>().to_uppercase()
}

fn is_active(row: &Row) -> bool {
    field(row, STATUS_ALIASES).eq_ignore_ascii_case("active")
}

/// Runs the roster through the filter pipeline:
/// active status, site, shift-code legality for the date, shift class.
pub fn ingest(table: &CsvTable, filter: &RosterFilter) -> Ingested {
    let total_rows = table.len();
    let mut notices = Vec::new();

    let active: Vec<&Row> = table.rows.iter().filter(|row| is_active(row)).collect();
    if active.is_empty() {
        let headers = table
            .rows
            .first()
            .map(|_| table.headers.clone())
            .unwrap_or_default();
        let notice = IngestNotice::NoActiveRows { row_count: total_rows, headers };
        warn!("{}", notice);
        notices.push(notice);
    }

    let allowed: BTreeSet<&str> = allowed_codes(filter.date, filter.shift);

    let mut site_matches = 0usize;
    let mut code_matches = 0usize;
    let mut people = Vec::new();

    for row in &active {
        let site = classify_site(row);
        if let Some(wanted) = filter.site {
            if site != wanted {
                continue;
            }
        }
        site_matches += 1;

        let shift_code = shift_code_of(field(row, SHIFT_PATTERN_ALIASES));
        if !allowed.contains(shift_code.as_str()) {
            continue;
        }
        code_matches += 1;

        if !filter.shift.contains(&shift_code) {
            continue;
        }

        people.push(Person {
            eid: field(row, EID_ALIASES).to_string(),
            name: field(row, NAME_ALIASES).to_string(),
            shift_code,
            site,
            barcode: field(row, BARCODE_ALIASES).to_string(),
            handle: field(row, HANDLE_ALIASES).to_string(),
            photo: field(row, PHOTO_ALIASES).to_string(),
        });
    }

    debug!(
        "roster filter: {} rows, {} active, {} site match, {} code match, {} kept",
        total_rows,
        active.len(),
        site_matches,
        code_matches,
        people.len()
    );

    if people.is_empty() {
        warn!("{}", IngestNotice::NoBadges);
        notices.push(IngestNotice::NoBadges);
    }

    Ingested {
        people,
        total_rows,
        active_rows: active.len(),
        notices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn monday() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, 1)
    }

    fn sample_row() -> Row {
        row(&[
            ("Employee Status", "Active"),
            ("Department ID", "1211010"),
            ("Shift Pattern", "DA-1"),
            ("Employee Name", "A"),
            ("Employee ID", "1"),
        ])
    }

    #[test]
    fn parses_both_input_date_formats() {
        assert_eq!(parse_input_date("01/02/2024"), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(parse_input_date("2024-02-01"), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(parse_input_date("2024/02/01"), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(parse_input_date("31/02/2024"), None);
        assert_eq!(parse_input_date("not a date"), None);
        assert_eq!(parse_input_date(""), None);
    }

    #[test]
    fn classifies_sites_by_department() {
        assert_eq!(classify_site(&row(&[("Department ID", "1211010")])), Site::Yhm2);
        assert_eq!(classify_site(&row(&[("Department ID", "1211070")])), Site::Ydd2);
        assert_eq!(
            classify_site(&row(&[("Department ID", "1211050"), ("Management Area ID", "22")])),
            Site::Ydd2
        );
        assert_eq!(
            classify_site(&row(&[("Department ID", "1211050"), ("Management Area ID", "21")])),
            Site::Other
        );
        assert_eq!(classify_site(&row(&[("Department ID", "999")])), Site::Other);
    }

    #[test]
    fn shift_code_takes_two_uppercase_letters() {
        assert_eq!(shift_code_of("da-1"), "DA");
        assert_eq!(shift_code_of(" NH0700"), "NH");
        assert_eq!(shift_code_of("D"), "D");
        assert_eq!(shift_code_of(""), "");
    }

    #[test]
    fn field_uses_first_non_empty_alias() {
        let r = row(&[("Name", ""), ("Full Name", "Jo Smith")]);
        assert_eq!(field(&r, NAME_ALIASES), "Jo Smith");
        assert_eq!(field(&r, EID_ALIASES), "");
    }

    #[test]
    fn monday_day_row_survives_for_matching_site() {
        let table = CsvTable::from_rows(vec![sample_row()]);
        let filter = RosterFilter { date: monday(), shift: ShiftKind::Day, site: Some(Site::Yhm2) };

        let out = ingest(&table, &filter);
        assert_eq!(out.people.len(), 1);
        assert_eq!(out.people[0].shift_code, "DA");
        assert_eq!(out.people[0].eid, "1");
        assert_eq!(out.people[0].site, Site::Yhm2);
        assert!(out.notices.is_empty());
    }

    #[test]
    fn site_mismatch_drops_the_row() {
        let table = CsvTable::from_rows(vec![sample_row()]);
        let filter = RosterFilter { date: monday(), shift: ShiftKind::Day, site: Some(Site::Ydd2) };

        let out = ingest(&table, &filter);
        assert!(out.people.is_empty());
        assert_eq!(out.notices, vec![IngestNotice::NoBadges]);
    }

    #[test]
    fn night_selection_drops_day_codes() {
        let table = CsvTable::from_rows(vec![sample_row()]);
        let filter = RosterFilter { date: monday(), shift: ShiftKind::Night, site: None };
        assert!(ingest(&table, &filter).people.is_empty());
    }

    #[test]
    fn shift_label_column_is_not_a_pattern() {
        let r = row(&[
            ("Employee Status", "Active"),
            ("Department ID", "1211010"),
            ("Shift", "Day"),
            ("Employee Name", "A"),
            ("Employee ID", "1"),
        ]);
        assert_eq!(field(&r, SHIFT_PATTERN_ALIASES), "");

        let table = CsvTable::from_rows(vec![r]);
        let filter = RosterFilter { date: monday(), shift: ShiftKind::Day, site: None };
        assert!(ingest(&table, &filter).people.is_empty());
    }

    #[test]
    fn inactive_roster_reports_headers() {
        let mut r = sample_row();
        r.insert("Employee Status".to_string(), "Terminated".to_string());
        let table = CsvTable::from_rows(vec![r]);
        let filter = RosterFilter { date: monday(), shift: ShiftKind::Day, site: None };

        let out = ingest(&table, &filter);
        assert_eq!(out.active_rows, 0);
        match &out.notices[0] {
            IngestNotice::NoActiveRows { row_count, headers } => {
                assert_eq!(*row_count, 1);
                assert!(headers.contains(&"Employee Status".to_string()));
            }
            other => panic!("unexpected notice {:?}", other),
        }
    }

    #[test]
    fn reads_csv_with_trimmed_headers() {
        let csv = "Employee Name , Employee ID,Employee Status\nAda, 7 ,active\n\n";
        let table = read_table_str(csv, CsvSource::Roster).unwrap();
        assert_eq!(table.headers, vec!["Employee Name", "Employee ID", "Employee Status"]);
        assert_eq!(table.len(), 1);
        assert_eq!(field(&table.rows[0], EID_ALIASES), "7");
    }

    #[test]
    fn blank_optional_file_is_empty_table() {
        let table = read_table_str("   \n", CsvSource::Swap).unwrap();
        assert!(table.is_empty());
        assert!(table.headers.is_empty());
    }
}
