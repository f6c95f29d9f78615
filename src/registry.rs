use crate::record::CertificateRecord;
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Boxed error type shared by the registry's fallible operations
pub type RegistryError = Box<dyn Error + Send + Sync>;

/// Cached snapshot of the record table plus the moment it was read
struct CachedTable {
    records: Arc<Vec<CertificateRecord>>,
    loaded_at: Instant,
}

/// Read-only view of the externally managed certificate table
///
/// The table lives in a spreadsheet and reaches the application as a CSV
/// export. The registry re-reads the file once the refresh interval has
/// elapsed, mirroring the TTL read the original data connection used; between
/// refreshes every request shares the same snapshot.
pub struct Registry {
    path: PathBuf,
    refresh: Duration,
    cache: RwLock<Option<CachedTable>>,
}

impl Registry {
    /// Create a registry backed by a CSV file
    ///
    /// # Arguments
    /// * `path` - Location of the exported record table
    /// * `refresh` - How long a loaded snapshot stays fresh
    pub fn new(path: impl Into<PathBuf>, refresh: Duration) -> Self {
        Registry {
            path: path.into(),
            refresh,
            cache: RwLock::new(None),
        }
    }

    /// Get the current record table, re-reading the file when stale
    ///
    /// # Returns
    /// * `Result<Arc<Vec<CertificateRecord>>, RegistryError>` - Shared
    ///   snapshot of the table
    ///
    /// # Errors
    /// * Propagates I/O and format errors from the underlying file; a cached
    ///   snapshot is *not* served past its refresh interval to mask them
    pub fn records(&self) -> Result<Arc<Vec<CertificateRecord>>, RegistryError> {
        {
            let cache = self.cache.read().unwrap();
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_at.elapsed() < self.refresh {
                    return Ok(Arc::clone(&cached.records));
                }
            }
        }

        let records = Arc::new(load_records(&self.path)?);
        log::info!(
            "loaded {} certificate records from {}",
            records.len(),
            self.path.display()
        );

        let mut cache = self.cache.write().unwrap();
        *cache = Some(CachedTable {
            records: Arc::clone(&records),
            loaded_at: Instant::now(),
        });

        Ok(records)
    }
}

/// Load certificate records from a CSV export
///
/// The first line must be a header; header names are trimmed and lowercased
/// before column mapping, so `ID,Name,…` and `id,name,…` both work. Rows
/// without an id are skipped with a warning. The date column is kept as raw
/// text; parsing happens at verification time so a single bad cell becomes a
/// per-record data error instead of a load failure.
///
/// # Arguments
/// * `filepath` - Path to the CSV file to load
///
/// # Returns
/// * `Result<Vec<CertificateRecord>, RegistryError>` - The loaded table
///
/// # Errors
/// * Returns an error if the file cannot be read, is empty, or its header
///   lacks the `id` column
pub fn load_records(filepath: impl AsRef<Path>) -> Result<Vec<CertificateRecord>, RegistryError> {
    let file = File::open(filepath.as_ref())?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

    if lines.is_empty() {
        return Err("record table is empty".into());
    }

    let columns = header_columns(&lines[0])?;
    let mut records = Vec::new();

    for (line_no, line) in lines.iter().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let fields = parse_csv_row(line);
        let field = |name: &str| -> String {
            columns
                .get(name)
                .and_then(|&idx| fields.get(idx))
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        let id = field("id");
        if id.is_empty() {
            log::warn!("skipping row {}: no certificate id", line_no + 1);
            continue;
        }

        records.push(CertificateRecord {
            id,
            name: field("name"),
            program: field("program"),
            instructor: field("instructor"),
            issue_date: field("date"),
        });
    }

    Ok(records)
}

// Map lowercased header names to their column index.
fn header_columns(header: &str) -> Result<HashMap<String, usize>, RegistryError> {
    let columns: HashMap<String, usize> = parse_csv_row(header)
        .into_iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().to_lowercase(), idx))
        .collect();

    if !columns.contains_key("id") {
        return Err("record table header has no \"id\" column".into());
    }

    Ok(columns)
}

// Split one CSV line into fields, honoring quoted fields and doubled quotes.
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Doubled quote inside a quoted field
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(current);
                current = String::new();
            }
            _ => current.push(c),
        }
    }

    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_table(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_a_simple_table() {
        let file = write_table(
            "id,name,program,instructor,date\n\
             CERT-001,Olena Shevchenko,2,I. Bondar,12.01.2025\n\
             CERT-002,Taras Melnyk,3,O. Kravets,15.05.2021\n",
        );

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "CERT-001");
        assert_eq!(records[0].program, "2");
        assert_eq!(records[1].issue_date, "15.05.2021");
    }

    #[test]
    fn header_names_are_case_and_space_insensitive() {
        let file = write_table(
            " ID , Name , Program , Instructor , Date \n\
             CERT-003,Ivan Koval,1,I. Bondar,01.03.2024\n",
        );

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Ivan Koval");
    }

    #[test]
    fn quoted_fields_keep_commas_and_quotes() {
        let file = write_table(
            "id,name,program,instructor,date\n\
             CERT-004,\"Melnyk, Taras\",4,\"I. \"\"Doc\"\" Bondar\",02.02.2024\n",
        );

        let records = load_records(file.path()).unwrap();
        assert_eq!(records[0].name, "Melnyk, Taras");
        assert_eq!(records[0].instructor, "I. \"Doc\" Bondar");
    }

    #[test]
    fn rows_without_an_id_are_skipped() {
        let file = write_table(
            "id,name,program,instructor,date\n\
             ,Ghost Row,1,X,01.01.2024\n\
             \n\
             CERT-005,Real Row,1,X,01.01.2024\n",
        );

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Real Row");
    }

    #[test]
    fn missing_id_column_is_a_load_error() {
        let file = write_table("name,program\nSomeone,1\n");
        assert!(load_records(file.path()).is_err());
    }

    #[test]
    fn empty_file_is_a_load_error() {
        let file = write_table("");
        assert!(load_records(file.path()).is_err());
    }

    #[test]
    fn registry_caches_within_the_refresh_interval() {
        let file = write_table("id,name,program,instructor,date\nCERT-006,A,1,X,01.01.2024\n");
        let registry = Registry::new(file.path(), Duration::from_secs(3600));

        let first = registry.records().unwrap();

        // Rewrite the file; the cached snapshot must still be served.
        std::fs::write(
            file.path(),
            "id,name,program,instructor,date\nCERT-007,B,1,X,01.01.2024\n",
        )
        .unwrap();

        let second = registry.records().unwrap();
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn registry_reloads_once_stale() {
        let file = write_table("id,name,program,instructor,date\nCERT-006,A,1,X,01.01.2024\n");
        let registry = Registry::new(file.path(), Duration::ZERO);

        registry.records().unwrap();

        std::fs::write(
            file.path(),
            "id,name,program,instructor,date\nCERT-007,B,1,X,01.01.2024\n",
        )
        .unwrap();

        let reloaded = registry.records().unwrap();
        assert_eq!(reloaded[0].id, "CERT-007");
    }

    #[test]
    fn missing_file_is_an_error() {
        let registry = Registry::new("/no/such/table.csv", Duration::from_secs(60));
        assert!(registry.records().is_err());
    }
}
