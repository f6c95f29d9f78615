use crate::record::{CertificateRecord, parse_issue_date, program_name, strip_export_artifact};
use chrono::{Duration, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Fixed validity period of every certificate, in days
pub const VALIDITY_DAYS: i64 = 1095;

/// A certificate within this many days of expiry is flagged as expiring soon
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Maximum accepted length of a normalized certificate number
pub const MAX_ID_LENGTH: usize = 20;

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^A-Z0-9]").unwrap();
}

/// Errors produced while verifying a certificate number
///
/// A lookup that simply finds nothing is *not* an error; it is reported as a
/// [`VerificationResult`] with `found == false`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The query was rejected before any lookup was attempted
    #[error("certificate number must contain 1 to {MAX_ID_LENGTH} letters or digits")]
    InvalidInput,

    /// A matched record holds data the application cannot interpret
    #[error("record \"{id}\": {reason}")]
    DataIntegrity {
        /// Id of the offending record
        id: String,
        /// What is wrong with the record
        reason: String,
    },
}

/// Validity status of a certificate relative to a reference date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    /// More than [`EXPIRY_WARNING_DAYS`] days of validity remain
    Active,
    /// Between 0 and [`EXPIRY_WARNING_DAYS`] days remain, inclusive
    ExpiringSoon,
    /// The validity period has elapsed
    Expired,
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CertificateStatus::Active => "Active",
            CertificateStatus::ExpiringSoon => "Expiring soon",
            CertificateStatus::Expired => "Expired",
        };
        write!(f, "{}", label)
    }
}

/// A matched certificate with its derived validity information
///
/// This is the payload handed to the web layer, the QR encoder and the PDF
/// renderer; everything they show comes from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedCertificate {
    /// Normalized certificate number
    pub id: String,

    /// Holder's display name
    pub name: String,

    /// Human-readable program name (already resolved from the code)
    pub program: String,

    /// Instructor(s) who ran the training
    pub instructor: String,

    /// Date the certificate was issued
    pub issue_date: NaiveDate,

    /// `issue_date` plus the fixed validity period
    pub expiry_date: NaiveDate,

    /// Whole days until expiry; negative once expired, never clamped
    pub days_left: i64,

    /// Derived validity status
    pub status: CertificateStatus,
}

/// Outcome of a certificate lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Whether a record matched the query
    pub found: bool,

    /// The matched certificate, when `found` is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<VerifiedCertificate>,
}

impl VerificationResult {
    /// The normal "no such certificate" outcome
    pub fn not_found() -> Self {
        VerificationResult {
            found: false,
            certificate: None,
        }
    }
}

/// Normalize a certificate number for comparison
///
/// Strips surrounding whitespace and the spreadsheet numeric-export suffix,
/// uppercases, and removes every character outside `A-Z0-9`. The same
/// normalization is applied to user input and to stored ids, which is what
/// makes the lookup case- and punctuation-insensitive. Normalization is
/// idempotent.
///
/// # Arguments
/// * `raw` - Certificate number as typed or as stored
///
/// # Returns
/// * `String` - The normalized form, possibly empty
///
/// # Examples
/// ```
/// use certcheck::verify::normalize_id;
///
/// assert_eq!(normalize_id("  cert-001 "), "CERT001");
/// assert_eq!(normalize_id("CERT001"), "CERT001");
/// assert_eq!(normalize_id("1024.0"), "1024");
/// ```
pub fn normalize_id(raw: &str) -> String {
    let cleaned = strip_export_artifact(raw.trim());
    NON_ALNUM.replace_all(&cleaned.to_uppercase(), "").into_owned()
}

/// Validate a user-supplied certificate number before lookup
///
/// # Arguments
/// * `raw` - Certificate number as typed or taken from a URL parameter
///
/// # Returns
/// * `Result<String, VerifyError>` - The normalized id ready for matching
///
/// # Errors
/// * [`VerifyError::InvalidInput`] when nothing usable remains after
///   normalization or the result exceeds [`MAX_ID_LENGTH`] characters
pub fn validate_query(raw: &str) -> Result<String, VerifyError> {
    let normalized = normalize_id(raw);
    if normalized.is_empty() || normalized.len() > MAX_ID_LENGTH {
        return Err(VerifyError::InvalidInput);
    }
    Ok(normalized)
}

/// Derive expiry information for an issue date relative to a reference date
///
/// # Arguments
/// * `issue_date` - Date the certificate was issued
/// * `on` - Reference date ("today" in production, fixed in tests)
///
/// # Returns
/// * `(NaiveDate, i64, CertificateStatus)` - Expiry date, whole days left
///   (negative once expired) and the derived status
pub fn evaluate_status(issue_date: NaiveDate, on: NaiveDate) -> (NaiveDate, i64, CertificateStatus) {
    let expiry_date = issue_date + Duration::days(VALIDITY_DAYS);
    let days_left = (expiry_date - on).num_days();

    let status = if days_left < 0 {
        CertificateStatus::Expired
    } else if days_left <= EXPIRY_WARNING_DAYS {
        CertificateStatus::ExpiringSoon
    } else {
        CertificateStatus::Active
    };

    (expiry_date, days_left, status)
}

/// Look up a certificate number in a record table and evaluate its validity
///
/// The query is validated and normalized first; the table is then scanned for
/// the first record whose normalized id matches exactly. No fuzzy or partial
/// matching. The function is pure: it only reads the records it is handed and
/// the reference date it is given.
///
/// # Arguments
/// * `raw_id` - Certificate number as typed or taken from a URL parameter
/// * `records` - The record table, already fetched by the registry
/// * `on` - Reference date for the status computation
///
/// # Returns
/// * `Result<VerificationResult, VerifyError>` - The lookup outcome; an
///   unknown id is `Ok` with `found == false`
///
/// # Errors
/// * [`VerifyError::InvalidInput`] when the query fails validation
/// * [`VerifyError::DataIntegrity`] when the matched record's issue date
///   cannot be parsed
pub fn verify<'a, I>(raw_id: &str, records: I, on: NaiveDate) -> Result<VerificationResult, VerifyError>
where
    I: IntoIterator<Item = &'a CertificateRecord>,
{
    let wanted = validate_query(raw_id)?;

    for record in records {
        if normalize_id(&record.id) != wanted {
            continue;
        }

        let issue_date =
            parse_issue_date(&record.issue_date).map_err(|reason| VerifyError::DataIntegrity {
                id: record.id.clone(),
                reason,
            })?;

        let (expiry_date, days_left, status) = evaluate_status(issue_date, on);

        return Ok(VerificationResult {
            found: true,
            certificate: Some(VerifiedCertificate {
                id: wanted,
                name: record.name.clone(),
                program: program_name(&record.program).to_string(),
                instructor: record.instructor.clone(),
                issue_date,
                expiry_date,
                days_left,
                status,
            }),
        });
    }

    Ok(VerificationResult::not_found())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_table() -> Vec<CertificateRecord> {
        vec![
            CertificateRecord {
                id: "CERT-001".to_string(),
                name: "Olena Shevchenko".to_string(),
                program: "2".to_string(),
                instructor: "I. Bondar".to_string(),
                issue_date: "2025-01-12".to_string(),
            },
            CertificateRecord {
                id: "CERT-002".to_string(),
                name: "Taras Melnyk".to_string(),
                program: "3".to_string(),
                instructor: "I. Bondar, O. Kravets".to_string(),
                issue_date: "15.05.2021".to_string(),
            },
            CertificateRecord {
                id: "CERT-BAD".to_string(),
                name: "Broken Row".to_string(),
                program: "1".to_string(),
                instructor: "".to_string(),
                issue_date: "sometime in May".to_string(),
            },
        ]
    }

    #[test]
    fn expiry_is_exactly_1095_days_after_issue() {
        let (expiry, _, _) = evaluate_status(date(2025, 1, 12), date(2025, 6, 1));
        assert_eq!(expiry - date(2025, 1, 12), Duration::days(1095));
        assert_eq!(expiry, date(2028, 1, 12));
    }

    #[test]
    fn status_boundaries() {
        let on = date(2025, 6, 1);

        // Pick issue dates that land exactly on the boundary day counts.
        let issued_31 = on + Duration::days(31) - Duration::days(VALIDITY_DAYS);
        let issued_30 = on + Duration::days(30) - Duration::days(VALIDITY_DAYS);
        let issued_0 = on - Duration::days(VALIDITY_DAYS);
        let issued_minus_1 = on - Duration::days(VALIDITY_DAYS + 1);

        let (_, days, status) = evaluate_status(issued_31, on);
        assert_eq!((days, status), (31, CertificateStatus::Active));

        let (_, days, status) = evaluate_status(issued_30, on);
        assert_eq!((days, status), (30, CertificateStatus::ExpiringSoon));

        let (_, days, status) = evaluate_status(issued_0, on);
        assert_eq!((days, status), (0, CertificateStatus::ExpiringSoon));

        let (_, days, status) = evaluate_status(issued_minus_1, on);
        assert_eq!((days, status), (-1, CertificateStatus::Expired));
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_id(" cert-001 ");
        let twice = normalize_id(&once);
        assert_eq!(once, "CERT001");
        assert_eq!(once, twice);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = vec![CertificateRecord {
            id: "A001".to_string(),
            name: "Case Test".to_string(),
            program: "1".to_string(),
            instructor: "X".to_string(),
            issue_date: "2025-01-01".to_string(),
        }];

        let lower = verify("a001", &table, date(2025, 2, 1)).unwrap();
        let upper = verify("A001", &table, date(2025, 2, 1)).unwrap();
        assert!(lower.found);
        assert!(upper.found);
        assert_eq!(
            lower.certificate.unwrap().id,
            upper.certificate.unwrap().id
        );
    }

    #[test]
    fn unknown_id_is_not_found_not_an_error() {
        let result = verify("NOPE123", &sample_table(), date(2025, 6, 1)).unwrap();
        assert!(!result.found);
        assert!(result.certificate.is_none());
    }

    #[test]
    fn active_certificate_scenario() {
        let result = verify("cert-001", &sample_table(), date(2025, 6, 1)).unwrap();
        assert!(result.found);

        let cert = result.certificate.unwrap();
        assert_eq!(cert.name, "Olena Shevchenko");
        assert_eq!(cert.program, "12-hour first aid training");
        assert_eq!(cert.days_left, 955);
        assert_eq!(cert.status, CertificateStatus::Active);
    }

    #[test]
    fn expired_certificate_scenario() {
        let result = verify("CERT-002", &sample_table(), date(2025, 6, 1)).unwrap();
        let cert = result.certificate.unwrap();
        assert!(cert.days_left < 0);
        assert_eq!(cert.status, CertificateStatus::Expired);
    }

    #[test]
    fn malformed_date_is_a_data_error() {
        let err = verify("CERT-BAD", &sample_table(), date(2025, 6, 1)).unwrap_err();
        match err {
            VerifyError::DataIntegrity { id, .. } => assert_eq!(id, "CERT-BAD"),
            other => panic!("expected data integrity error, got {:?}", other),
        }
    }

    #[test]
    fn empty_and_oversized_queries_are_rejected_before_lookup() {
        assert_eq!(
            verify("", &sample_table(), date(2025, 6, 1)),
            Err(VerifyError::InvalidInput)
        );
        assert_eq!(
            verify("   --- ", &sample_table(), date(2025, 6, 1)),
            Err(VerifyError::InvalidInput)
        );
        assert_eq!(
            verify(&"A".repeat(21), &sample_table(), date(2025, 6, 1)),
            Err(VerifyError::InvalidInput)
        );
        // 20 characters is still acceptable input.
        assert_eq!(
            verify(&"A".repeat(20), &sample_table(), date(2025, 6, 1)),
            Ok(VerificationResult::not_found())
        );
    }

    #[test]
    fn first_match_wins_on_duplicate_ids() {
        let mut table = sample_table();
        table.push(CertificateRecord {
            id: "cert 001".to_string(),
            name: "Shadow Duplicate".to_string(),
            program: "1".to_string(),
            instructor: "Y".to_string(),
            issue_date: "2020-01-01".to_string(),
        });

        let cert = verify("CERT001", &table, date(2025, 6, 1))
            .unwrap()
            .certificate
            .unwrap();
        assert_eq!(cert.name, "Olena Shevchenko");
    }

    #[test]
    fn status_serializes_in_wire_form() {
        let json = serde_json::to_string(&CertificateStatus::ExpiringSoon).unwrap();
        assert_eq!(json, "\"EXPIRING_SOON\"");
    }
}
