use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Day shift codes
pub const DAY_CODES: [&str; 6] = ["DA", "DB", "DC", "DL", "DN", "DH"];
/// Night shift codes
pub const NIGHT_CODES: [&str; 6] = ["NA", "NB", "NC", "NL", "NN", "NH"];

/// Allowed shift codes per weekday, indexed from Sunday (0) to Saturday (6)
const WEEKDAY_CODES: [&[&str]; 7] = [
    // Sunday
    &["DA", "DC", "DL", "NA", "NC", "NL"],
    // Monday
    &["DA", "DC", "DL", "DH", "NA", "NC", "NL", "NH"],
    // Tuesday
    &["DA", "DC", "DL", "DH", "NA", "NC", "NL", "NH"],
    // Wednesday
    &["DA", "DB", "DH", "DN", "NA", "NB", "NH", "NN"],
    // Thursday
    &["DB", "DN", "DH", "NB", "NN", "NH"],
    // Friday
    &["DB", "DN", "NB", "NN"],
    // Saturday
    &["DB", "DN", "DL", "NB", "NN", "NL"],
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Shift selector from the planning form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftKind {
    Day,
    Night,
}

impl ShiftKind {
    /// The fixed code set belonging to this shift class
    pub fn code_set(self) -> &'static [&'static str; 6] {
        match self {
            ShiftKind::Day => &DAY_CODES,
            ShiftKind::Night => &NIGHT_CODES,
        }
    }

    pub fn contains(self, code: &str) -> bool {
        self.code_set().contains(&code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftKind::Day => "day",
            ShiftKind::Night => "night",
        }
    }
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(ShiftKind::Day),
            "night" => Ok(ShiftKind::Night),
            other => Err(format!("unknown shift '{}', expected day or night", other)),
        }
    }
}

/// Class of a shift code, decided by its first letter
pub fn shift_class(code: &str) -> Option<ShiftKind> {
    match code.chars().next() {
        Some('D') => Some(ShiftKind::Day),
        Some('N') => Some(ShiftKind::Night),
        _ => None,
    }
}

/// Weekday index counted from Sunday = 0
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAY_NAMES[weekday_index(date)]
}

/// Shift codes allowed to work on `date` for the selected shift.
/// An unparseable date (`None`) allows nothing.
pub fn allowed_codes(date: Option<NaiveDate>, shift: ShiftKind) -> BTreeSet<&'static str> {
    let Some(date) = date else {
        return BTreeSet::new();
    };

    WEEKDAY_CODES[weekday_index(date)]
        .iter()
        .copied()
        .filter(|code| shift.contains(code))
        .collect()
}

/// Shift-type label: front half of the week is Sunday..Wednesday (0-3),
/// back half is Thursday..Saturday (4-6)
pub fn shift_type_label(shift: ShiftKind, weekday_index: usize) -> &'static str {
    let front_half = weekday_index <= 3;
    match (shift, front_half) {
        (ShiftKind::Day, true) => "FHD",
        (ShiftKind::Day, false) => "BHD",
        (ShiftKind::Night, true) => "FHN",
        (ShiftKind::Night, false) => "BHN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn allowed_codes_stay_inside_their_class_and_are_disjoint() {
        // one full week starting on a Sunday
        for offset in 0..7 {
            let d = date(2024, 1, 7) + chrono::Duration::days(offset);
            let day = allowed_codes(Some(d), ShiftKind::Day);
            let night = allowed_codes(Some(d), ShiftKind::Night);

            assert!(day.iter().all(|c| DAY_CODES.contains(c)), "{:?}", day);
            assert!(night.iter().all(|c| NIGHT_CODES.contains(c)), "{:?}", night);
            assert!(day.is_disjoint(&night));
        }
    }

    #[test]
    fn monday_day_shift_allows_da() {
        let monday = date(2024, 1, 1);
        assert_eq!(weekday_name(monday), "Monday");
        assert!(allowed_codes(Some(monday), ShiftKind::Day).contains("DA"));
        assert!(!allowed_codes(Some(monday), ShiftKind::Day).contains("DB"));
    }

    #[test]
    fn missing_date_allows_nothing() {
        assert!(allowed_codes(None, ShiftKind::Day).is_empty());
        assert!(allowed_codes(None, ShiftKind::Night).is_empty());
    }

    #[test]
    fn shift_type_labels_split_the_week() {
        assert_eq!(shift_type_label(ShiftKind::Day, 0), "FHD");
        assert_eq!(shift_type_label(ShiftKind::Day, 3), "FHD");
        assert_eq!(shift_type_label(ShiftKind::Day, 4), "BHD");
        assert_eq!(shift_type_label(ShiftKind::Night, 2), "FHN");
        assert_eq!(shift_type_label(ShiftKind::Night, 6), "BHN");
    }

    #[test]
    fn shift_class_uses_first_letter() {
        assert_eq!(shift_class("DH"), Some(ShiftKind::Day));
        assert_eq!(shift_class("NL"), Some(ShiftKind::Night));
        assert_eq!(shift_class("XX"), None);
        assert_eq!(shift_class(""), None);
        assert_eq!("Night".parse::<ShiftKind>(), Ok(ShiftKind::Night));
        assert!("evening".parse::<ShiftKind>().is_err());
    }
}
