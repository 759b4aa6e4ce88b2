//! CSV export of a generated dataset plus a JSON manifest carrying its sha256.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::Opportunity;

pub const EXPECTED_COLUMNS: [&str; 11] = [
    "id",
    "account_name",
    "stage",
    "product",
    "amount",
    "probability",
    "region",
    "owner",
    "created_date",
    "close_date",
    "days_in_stage",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub path: String,
    pub hash_sha256: String,
    pub row_count: u64,
    pub columns: Vec<String>,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub columns: Vec<String>,
    pub expected: Vec<String>,
    pub ok: bool,
    pub message: String,
}

/// Quote a field only when it needs it.
fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_row(o: &Opportunity) -> String {
    [
        csv_field(&o.id),
        csv_field(&o.account_name),
        o.stage.to_string(),
        o.product.to_string(),
        format!("{}", o.amount),
        o.probability.to_string(),
        o.region.to_string(),
        o.owner.to_string(),
        o.created_date.to_string(),
        o.close_date.to_string(),
        o.days_in_stage.to_string(),
    ]
    .join(",")
}

pub fn write_csv(path: &Path, records: &[Opportunity]) -> Result<u64> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "{}", EXPECTED_COLUMNS.join(","))?;
    for opp in records {
        writeln!(w, "{}", csv_row(opp))?;
    }
    w.flush()?;
    Ok(records.len() as u64)
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let mut p = dataset_path.to_path_buf();
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("opportunities.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}

/// Write `{dir}/opportunities.csv` and its manifest; returns the manifest.
pub fn export_dataset(dir: &Path, records: &[Opportunity], generated_at: &str) -> Result<ExportManifest> {
    let csv_path = dir.join("opportunities.csv");
    let row_count = write_csv(&csv_path, records)?;
    let manifest = ExportManifest {
        path: csv_path.display().to_string(),
        hash_sha256: file_sha256(&csv_path)?,
        row_count,
        columns: EXPECTED_COLUMNS.iter().map(|s| s.to_string()).collect(),
        generated_at: generated_at.to_string(),
    };
    let manifest_path = default_manifest_path(&csv_path);
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("writing {}", manifest_path.display()))?;

    log(
        Level::Info,
        Domain::Export,
        "dataset_exported",
        obj(&[
            ("path", v_str(&manifest.path)),
            ("rows", serde_json::json!(row_count)),
            ("sha256", v_str(&manifest.hash_sha256)),
        ]),
    );
    Ok(manifest)
}

pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut first = String::new();
    BufReader::new(file).read_line(&mut first)?;
    let trimmed = first.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{} is empty", path.display()));
    }
    Ok(trimmed.split(',').map(|s| s.trim().to_string()).collect())
}

pub fn validate_schema(path: &Path) -> Result<SchemaReport> {
    let header = read_header(path)?;
    let expected = EXPECTED_COLUMNS.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let ok = header == expected;
    let message = if ok {
        "schema ok".to_string()
    } else {
        format!("schema mismatch: got {:?} expected {:?}", header, expected)
    };
    Ok(SchemaReport { columns: header, expected, ok, message })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use chrono::NaiveDate;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::TempDir;

    fn records(n: usize) -> Vec<Opportunity> {
        let mut rng = StdRng::seed_from_u64(21);
        generate(&mut rng, NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(), n)
    }

    #[test]
    fn test_export_writes_rows_and_matching_hash() {
        let dir = TempDir::new().unwrap();
        let data = records(12);
        let manifest = export_dataset(dir.path(), &data, "2026-10-17T00:00:00.000Z").unwrap();
        assert_eq!(manifest.row_count, 12);

        let csv_path = dir.path().join("opportunities.csv");
        let body = fs::read_to_string(&csv_path).unwrap();
        assert_eq!(body.lines().count(), 13);
        assert!(body.lines().nth(1).unwrap().starts_with("OPP-1000,"));
        assert_eq!(manifest.hash_sha256, file_sha256(&csv_path).unwrap());

        let on_disk: ExportManifest =
            serde_json::from_str(&fs::read_to_string(default_manifest_path(&csv_path)).unwrap()).unwrap();
        assert_eq!(on_disk.hash_sha256, manifest.hash_sha256);
    }

    #[test]
    fn test_schema_accepts_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("opps.csv");
        write_csv(&path, &records(2)).unwrap();
        assert!(validate_schema(&path).unwrap().ok);
    }

    #[test]
    fn test_schema_rejects_bad_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "id,stage,amount\nOPP-1,Proposal,10\n").unwrap();
        let report = validate_schema(&path).unwrap();
        assert!(!report.ok);
    }

    #[test]
    fn test_empty_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();
        assert!(read_header(&path).is_err());
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_manifest_path() {
        let p = default_manifest_path(Path::new("/tmp/x/opportunities.csv"));
        assert_eq!(p, PathBuf::from("/tmp/x/opportunities.csv.manifest.json"));
    }
}
