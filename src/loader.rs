//! Loading a `TransactionTable` from a CSV source, with a cache keyed by source identity.
//!
//! A source is either a path on disk (the default dataset, identified by its path string) or an
//! upload: bytes handed over by the user, identified by the SHA-256 of their content. The cache
//! keeps parsed tables until they are explicitly invalidated.

use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{Mapping, TransactionTable, REQUIRED_COLUMNS};
use crate::{utils, Result};
use anyhow::{bail, Context};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Where the transaction data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A file on disk that is read when the table is (re)loaded.
    Path(PathBuf),
    /// Bytes supplied by the user, e.g. an uploaded file, with the name it was uploaded as.
    Upload { name: String, bytes: Arc<Vec<u8>> },
}

impl Source {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Source::Path(path.into())
    }

    pub fn upload(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Source::Upload {
            name: name.into(),
            bytes: Arc::new(bytes.into()),
        }
    }

    /// Reads a file as if the user had uploaded it.
    pub async fn upload_file(path: &Path) -> Result<Self> {
        let bytes = utils::read_bytes(path)
            .await
            .context("Unable to read the uploaded file")
            .pub_result(ErrorType::Load)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Source::upload(name, bytes))
    }

    /// The identity under which the parsed table is cached.
    pub fn key(&self) -> SourceKey {
        match self {
            Source::Path(path) => SourceKey::Path(path.to_string_lossy().to_string()),
            Source::Upload { bytes, .. } => {
                SourceKey::Content(hex::encode(Sha256::digest(bytes.as_slice())))
            }
        }
    }

    /// A short human readable name.
    pub fn name(&self) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            Source::Upload { name, .. } => name.clone(),
        }
    }
}

/// The cache key of a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKey {
    Path(String),
    /// Lowercase hex SHA-256 of the uploaded bytes.
    Content(String),
}

impl Display for SourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKey::Path(p) => write!(f, "path:{p}"),
            SourceKey::Content(hash) => write!(f, "sha256:{hash}"),
        }
    }
}

/// Parsed tables by source identity.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: HashMap<SourceKey, Arc<TransactionTable>>,
    loads: usize,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table for `source`, loading and caching it on a miss. Failed loads are
    /// not cached.
    pub async fn get_or_load(&mut self, source: &Source) -> Result<Arc<TransactionTable>> {
        let key = source.key();
        if let Some(table) = self.entries.get(&key) {
            debug!("Cache hit for {key}");
            return Ok(Arc::clone(table));
        }
        debug!("Cache miss for {key}");
        let table = Arc::new(load(source).await?);
        self.loads += 1;
        self.entries.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Drops the cached table for `key`. Returns whether there was one.
    pub fn invalidate(&mut self, key: &SourceKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            debug!("Invalidated cache entry {key}");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &SourceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many times a source has actually been read and parsed.
    pub fn loads(&self) -> usize {
        self.loads
    }
}

/// Reads and parses `source` without consulting any cache.
///
/// # Errors
/// - `ErrorType::Load` if the source cannot be read, is not valid CSV or lacks required columns.
/// - `ErrorType::Parse` if a date or number cannot be parsed.
pub async fn load(source: &Source) -> Result<TransactionTable> {
    let started = Instant::now();
    let table = match source {
        Source::Path(path) => {
            let bytes = utils::read_bytes(path)
                .await
                .with_context(|| format!("Unable to load the dataset '{}'", path.display()))
                .pub_result(ErrorType::Load)?;
            parse(&bytes)?
        }
        Source::Upload { bytes, .. } => parse(bytes)?,
    };
    info!(
        "Loaded {} rows from {} in {:?}",
        table.len(),
        source.name(),
        started.elapsed()
    );
    Ok(table)
}

/// Parses CSV bytes into a `TransactionTable`.
pub fn parse(bytes: &[u8]) -> Result<TransactionTable> {
    let (header, rows) = read_records(bytes)
        .context("Unable to read CSV data")
        .pub_result(ErrorType::Load)?;
    Mapping::new(&header)
        .and_then(|mapping| mapping.require(REQUIRED_COLUMNS).map(|_| ()))
        .context("The CSV header is not usable")
        .pub_result(ErrorType::Load)?;
    TransactionTable::new(header, rows).pub_result(ErrorType::Parse)
}

fn read_records(bytes: &[u8]) -> Res<(Vec<String>, Vec<Vec<String>>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let header: Vec<String> = rdr
        .headers()
        .context("Unable to read the header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() > header.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            bail!(
                "Line {line} has {} fields but the header has {}",
                record.len(),
                header.len()
            );
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{write_csv, SAMPLE_CSV};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_path() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "dataset.csv", SAMPLE_CSV);
        let table = load(&Source::path(&path)).await.unwrap();
        assert_eq!(table.len(), 6);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_load_error() {
        let dir = TempDir::new().unwrap();
        let err = load(&Source::path(dir.path().join("nope.csv")))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Load);
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn test_parse_missing_column_is_load_error() {
        let err = parse(b"Transaction Date,Item,Quantity\n2024-01-01,Tea,1\n").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Load);
        assert!(err.to_string().contains("Total Spent"));
    }

    #[test]
    fn test_parse_bad_date_is_parse_error() {
        let err = parse(b"Transaction Date,Item,Quantity,Total Spent\nsoon,Tea,1,2.50\n")
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Parse);
    }

    #[test]
    fn test_parse_strips_bom_and_passes_extra_columns() {
        let csv = "\u{feff}Transaction Date,Item,Quantity,Total Spent,Location\n\
                   2024-01-01,Tea,2,2.50,Takeaway\n";
        let table = parse(csv.as_bytes()).unwrap();
        assert_eq!(table.headers()[0], "Transaction Date");
        assert_eq!(table.transactions()[0].raw(4), "Takeaway");
    }

    #[test]
    fn test_parse_unsummable_quantity_is_parse_error() {
        let csv = "Transaction Date,Item,Quantity,Total Spent\n\
                   2024-01-01,Tea,79228162514264337593543950335,1.00\n\
                   2024-01-02,Tea,79228162514264337593543950335,1.00\n";
        let err = parse(csv.as_bytes()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Parse);
        assert!(format!("{err:#}").contains("'Quantity'"));
    }

    #[test]
    fn test_parse_row_longer_than_header_is_load_error() {
        let csv = "Transaction Date,Item,Quantity,Total Spent\n\
                   2024-01-01,Tea,1,2.50\n\
                   2024-01-02,Tea,1,2.50,extra\n";
        let err = parse(csv.as_bytes()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Load);
        assert!(format!("{err:#}").contains("Line 3 has 5 fields"));
    }

    #[test]
    fn test_parse_bundled_dataset() {
        let table = parse(include_bytes!("../archive/dataset.csv")).unwrap();
        assert_eq!(table.len(), 400);
    }

    #[test]
    fn test_upload_key_is_content_hash() {
        let a = Source::upload("a.csv", b"same".to_vec());
        let b = Source::upload("b.csv", b"same".to_vec());
        let c = Source::upload("a.csv", b"different".to_vec());
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert_eq!(
            a.key(),
            SourceKey::Content(
                "0967115f2813a3541eaef77de9d9d5773f1c0c04314b0bbfe4ff3b3b1c55b5d5".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_cache_hit_does_not_reread() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "dataset.csv", SAMPLE_CSV);
        let source = Source::path(&path);
        let mut cache = SourceCache::new();

        let first = cache.get_or_load(&source).await.unwrap();
        // Changing the file does not matter while the path is cached.
        write_csv(
            dir.path(),
            "dataset.csv",
            "Transaction Date,Item,Quantity,Total Spent\n",
        );
        let second = cache.get_or_load(&source).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.loads(), 1);

        assert!(cache.invalidate(&source.key()));
        let third = cache.get_or_load(&source).await.unwrap();
        assert_eq!(third.len(), 0);
        assert_eq!(cache.loads(), 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_keep_failures() {
        let mut cache = SourceCache::new();
        let source = Source::upload("bad.csv", b"Item\nTea\n".to_vec());
        assert!(cache.get_or_load(&source).await.is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.loads(), 0);
    }
}
