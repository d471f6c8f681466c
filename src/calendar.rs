// src/calendar.rs
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Month names the resolver falls back to when the active display language
/// does not recognise the input.
pub const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Formats tried, in order, when neither name table matches.
const GENERIC_FORMATS: [&str; 2] = ["%B %d, %Y", "%m %d, %Y"];

/// Canonical `YYYY-MM-DD` key addressing per-day facts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IsoKey(String);

impl IsoKey {
    /// Zero-pads day and month; the year is used as given.
    pub fn from_parts(day: u32, month: u32, year: &str) -> Self {
        IsoKey(format!("{year}-{month:02}-{day:02}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IsoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns a displayed `{day, month name, year}` into its ISO key.
///
/// `localized_months` holds the twelve month names of the active display
/// language, January first. Resolution tries that table, then the English
/// table, then a generic date parse. When all three fail the result is
/// `None`; there is no default month.
pub fn resolve<S: AsRef<str>>(
    day: u32,
    month_name: &str,
    year: &str,
    localized_months: &[S],
) -> Option<IsoKey> {
    if !(1..=31).contains(&day) {
        tracing::debug!(day, "day out of range");
        return None;
    }

    let month = month_number(month_name, year, localized_months)?;
    Some(IsoKey::from_parts(day, month, year))
}

/// Month number in `1..=12` for `month_name`, or `None` if unresolvable.
pub fn month_number<S: AsRef<str>>(
    month_name: &str,
    year: &str,
    localized_months: &[S],
) -> Option<u32> {
    let name = month_name.trim();
    if name.is_empty() {
        return None;
    }

    if let Some(month) = position_in(name, localized_months) {
        return Some(month);
    }

    if let Some(month) = position_in(name, &ENGLISH_MONTHS) {
        tracing::debug!(month_name = name, "matched english month table");
        return Some(month);
    }

    let generic = format!("{name} 1, {}", year.trim());
    let parsed = GENERIC_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&generic, fmt).ok())
        .map(|date| date.month());

    match parsed {
        Some(month) => tracing::debug!(month_name = name, month, "matched generic date parse"),
        None => tracing::debug!(month_name = name, year, "month unresolvable"),
    }
    parsed
}

fn position_in<S: AsRef<str>>(name: &str, table: &[S]) -> Option<u32> {
    let wanted = name.to_lowercase();
    table
        .iter()
        .take(12)
        .position(|candidate| candidate.as_ref().trim().to_lowercase() == wanted)
        .map(|idx| idx as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPANISH: [&str; 12] = [
        "Enero",
        "Febrero",
        "Marzo",
        "Abril",
        "Mayo",
        "Junio",
        "Julio",
        "Agosto",
        "Septiembre",
        "Octubre",
        "Noviembre",
        "Diciembre",
    ];

    const GERMAN: [&str; 12] = [
        "Januar",
        "Februar",
        "März",
        "April",
        "Mai",
        "Juni",
        "Juli",
        "August",
        "September",
        "Oktober",
        "November",
        "Dezember",
    ];

    fn key(s: &str) -> Option<IsoKey> {
        Some(IsoKey(s.to_string()))
    }

    #[test]
    fn resolves_against_english_table() {
        assert_eq!(resolve(5, "March", "2025", &ENGLISH_MONTHS), key("2025-03-05"));
    }

    #[test]
    fn resolves_against_active_language_table() {
        assert_eq!(resolve(5, "Marzo", "2025", &SPANISH), key("2025-03-05"));
    }

    #[test]
    fn falls_back_to_english_when_active_table_misses() {
        assert_eq!(resolve(5, "March", "2025", &SPANISH), key("2025-03-05"));
    }

    #[test]
    fn unknown_month_is_unresolvable() {
        assert_eq!(resolve(5, "Not-A-Month", "2025", &ENGLISH_MONTHS), None);
    }

    #[test]
    fn never_defaults_to_january() {
        assert_eq!(resolve(1, "", "2025", &ENGLISH_MONTHS), None);
        assert_eq!(resolve(1, "Smarch", "2025", &SPANISH), None);
    }

    #[test]
    fn matching_is_case_insensitive_including_non_ascii() {
        assert_eq!(resolve(12, "MÄRZ", "2024", &GERMAN), key("2024-03-12"));
        assert_eq!(resolve(12, "december", "2024", &SPANISH), key("2024-12-12"));
    }

    #[test]
    fn generic_parse_accepts_abbreviations() {
        assert_eq!(resolve(9, "Sep", "2025", &SPANISH), key("2025-09-09"));
        assert_eq!(resolve(9, "oct", "2025", &ENGLISH_MONTHS), key("2025-10-09"));
    }

    #[test]
    fn generic_parse_accepts_numeric_month() {
        assert_eq!(resolve(28, "02", "2026", &ENGLISH_MONTHS), key("2026-02-28"));
    }

    #[test]
    fn numeric_month_outside_range_is_unresolvable() {
        assert_eq!(resolve(1, "13", "2026", &ENGLISH_MONTHS), None);
    }

    #[test]
    fn day_out_of_range_is_unresolvable() {
        assert_eq!(resolve(0, "March", "2025", &ENGLISH_MONTHS), None);
        assert_eq!(resolve(32, "March", "2025", &ENGLISH_MONTHS), None);
    }

    #[test]
    fn year_is_used_verbatim() {
        assert_eq!(resolve(3, "Enero", "0999", &SPANISH), key("0999-01-03"));
    }

    #[test]
    fn owned_tables_are_accepted() {
        let table: Vec<String> = SPANISH.iter().map(|s| s.to_string()).collect();
        assert_eq!(resolve(31, "Diciembre", "2025", table.as_slice()), key("2025-12-31"));
    }
}
