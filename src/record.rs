use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// A single issued training certificate, as read from the record table
///
/// Records are created and edited externally in the spreadsheet; the
/// application only ever reads them. The issue date is kept as the raw
/// spreadsheet cell and parsed on demand, so one malformed cell surfaces as a
/// per-record data error instead of failing the whole table load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Certificate number (unique within the table; first match wins)
    pub id: String,

    /// Holder's display name
    pub name: String,

    /// Program code, resolved to a display name via [`program_name`]
    pub program: String,

    /// Instructor(s) who ran the training (free text)
    pub instructor: String,

    /// Issue date cell, raw text until verification time
    pub issue_date: String,
}

/// Display name used for program codes missing from the program table
pub const FALLBACK_PROGRAM: &str = "Specialized training";

lazy_static! {
    /// Static program table mapping spreadsheet program codes to display names
    static ref PROGRAMS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("1", "6-hour first aid training");
        m.insert("2", "12-hour first aid training");
        m.insert("3", "48-hour pre-medical aid training");
        m.insert("4", "First aid for pets training");
        m
    };

    // Numeric cells come back as "2.0" when the spreadsheet is exported.
    static ref FLOAT_SUFFIX: Regex = Regex::new(r"\.0+$").unwrap();
}

/// Accepted issue-date formats, day-first variants tried before ISO
const DATE_FORMATS: [&str; 4] = ["%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

/// Remove the `.0` suffix a spreadsheet export appends to numeric cells
///
/// # Arguments
/// * `cell` - Raw cell text
///
/// # Returns
/// * `Cow<str>` - The cell text without a trailing `.0`/`.00`/…
pub fn strip_export_artifact(cell: &str) -> Cow<'_, str> {
    FLOAT_SUFFIX.replace(cell, "")
}

/// Resolve a program code to its display name
///
/// The code is trimmed and cleaned of the numeric-export suffix before the
/// table lookup. Codes not present in the table resolve to
/// [`FALLBACK_PROGRAM`].
///
/// # Arguments
/// * `code` - Raw program cell from the record table
///
/// # Returns
/// * `&'static str` - Human-readable program name
///
/// # Examples
/// ```
/// use certcheck::record::program_name;
///
/// assert_eq!(program_name("2"), "12-hour first aid training");
/// assert_eq!(program_name(" 2.0 "), "12-hour first aid training");
/// assert_eq!(program_name("99"), "Specialized training");
/// ```
pub fn program_name(code: &str) -> &'static str {
    let code = strip_export_artifact(code.trim());
    PROGRAMS.get(code.as_ref()).copied().unwrap_or(FALLBACK_PROGRAM)
}

/// Parse a raw issue-date cell into a calendar date
///
/// Day-first formats are tried first, matching how the dates are entered in
/// the source spreadsheet, with ISO as a fallback.
///
/// # Arguments
/// * `raw` - Raw date cell text
///
/// # Returns
/// * `Result<NaiveDate, String>` - The parsed date, or a description of why
///   the cell is unusable
///
/// # Errors
/// * Returns an error when the cell is empty or matches none of the accepted
///   formats
pub fn parse_issue_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("issue date is missing".to_string());
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }

    Err(format!("unrecognized issue date \"{}\"", raw))
}
