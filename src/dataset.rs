//! Dataset loading and integrity checks.
//!
//! The surveillance CSV is read once at startup and held read-only for the
//! process lifetime. Required columns may appear in any order; extra columns
//! are ignored. Rows that fail to parse are skipped and counted rather than
//! aborting the load, since open-data exports routinely carry a handful of
//! malformed lines.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

pub const REQUIRED_COLUMNS: [&str; 6] =
    ["departamento", "provincia", "distrito", "ano", "edad", "sexo"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim() {
            "M" | "m" => Ok(Sex::M),
            "F" | "f" => Ok(Sex::F),
            other => Err(format!("bad sexo value: {:?}", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub departamento: String,
    pub provincia: String,
    pub distrito: String,
    pub ano: u16,
    pub edad: u16,
    pub sexo: Sex,
}

/// In-memory record table. Immutable after load.
#[derive(Debug)]
pub struct Dataset {
    rows: Vec<Record>,
    bad_rows: u64,
}

impl Dataset {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows, bad_rows: 0 }
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn bad_rows(&self) -> u64 {
        self.bad_rows
    }

    /// Sorted distinct departments, for the required dropdown.
    pub fn departments(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.departamento.as_str()).collect();
        set.into_iter().map(|s| s.to_string()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaReport {
    pub columns: Vec<String>,
    pub missing: Vec<String>,
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub hash_sha256: String,
    pub row_count: u64,
    pub bad_rows: u64,
    pub columns: Vec<String>,
    pub departments: u64,
    pub provinces: u64,
    pub districts: u64,
    pub year_min: Option<u16>,
    pub year_max: Option<u16>,
    pub generated_at_epoch: u64,
}

/// Maps required column names to their positions in this file's header.
struct ColumnIndex {
    departamento: usize,
    provincia: usize,
    distrito: usize,
    ano: usize,
    edad: usize,
    sexo: usize,
}

impl ColumnIndex {
    fn from_header(header: &[String]) -> Result<Self, String> {
        let find = |name: &str| -> Result<usize, String> {
            header
                .iter()
                .position(|c| c.eq_ignore_ascii_case(name))
                .ok_or_else(|| format!("missing required column: {}", name))
        };
        Ok(Self {
            departamento: find("departamento")?,
            provincia: find("provincia")?,
            distrito: find("distrito")?,
            ano: find("ano")?,
            edad: find("edad")?,
            sexo: find("sexo")?,
        })
    }

    fn parse_row(&self, line: &str) -> Result<Record, String> {
        let parts: Vec<&str> = line.split(',').collect();
        let width = [
            self.departamento,
            self.provincia,
            self.distrito,
            self.ano,
            self.edad,
            self.sexo,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        if parts.len() <= width {
            return Err(format!("expected {}+ columns, got {}", width + 1, parts.len()));
        }
        let ano = parts[self.ano]
            .trim()
            .parse::<u16>()
            .map_err(|e| format!("bad ano: {}", e))?;
        let edad = parts[self.edad]
            .trim()
            .parse::<u16>()
            .map_err(|e| format!("bad edad: {}", e))?;
        let sexo = Sex::parse(parts[self.sexo])?;
        Ok(Record {
            departamento: parts[self.departamento].trim().to_string(),
            provincia: parts[self.provincia].trim().to_string(),
            distrito: parts[self.distrito].trim().to_string(),
            ano,
            edad,
            sexo,
        })
    }
}

pub fn read_header(path: &Path) -> Result<Vec<String>, String> {
    let file = File::open(path).map_err(|e| format!("open {}: {}", path.display(), e))?;
    let reader = BufReader::new(file);
    for line in reader.lines() {
        let line = line.map_err(|e| e.to_string())?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        return Ok(trimmed.split(',').map(|s| s.trim().to_string()).collect());
    }
    Err("empty file: no header line".to_string())
}

pub fn validate_schema(path: &Path) -> Result<SchemaReport, String> {
    let header = read_header(path)?;
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !header.iter().any(|c| c.eq_ignore_ascii_case(name)))
        .map(|s| s.to_string())
        .collect();
    let ok = missing.is_empty();
    let message = if ok {
        "schema ok".to_string()
    } else {
        format!("missing required columns: {}", missing.join(", "))
    };
    Ok(SchemaReport {
        columns: header,
        missing,
        ok,
        message,
    })
}

pub fn load_csv(path: &Path) -> Result<Dataset, String> {
    let file = File::open(path).map_err(|e| format!("open {}: {}", path.display(), e))?;
    let reader = BufReader::new(file);

    let mut cols: Option<ColumnIndex> = None;
    let mut rows = Vec::new();
    let mut bad_rows = 0u64;

    for line in reader.lines() {
        let line = line.map_err(|e| e.to_string())?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match &cols {
            None => {
                let header: Vec<String> =
                    trimmed.split(',').map(|s| s.trim().to_string()).collect();
                cols = Some(ColumnIndex::from_header(&header)?);
            }
            Some(idx) => match idx.parse_row(trimmed) {
                Ok(r) => rows.push(r),
                Err(_) => bad_rows += 1,
            },
        }
    }

    if cols.is_none() {
        return Err("empty file: no header line".to_string());
    }

    Ok(Dataset { rows, bad_rows })
}

pub fn analyze_csv(path: &Path, now_ts: u64) -> Result<DatasetManifest, String> {
    let header = read_header(path)?;
    let ds = load_csv(path)?;
    let hash = file_sha256(path)?;

    let departments: BTreeSet<&str> = ds.rows.iter().map(|r| r.departamento.as_str()).collect();
    let provinces: BTreeSet<&str> = ds.rows.iter().map(|r| r.provincia.as_str()).collect();
    let districts: BTreeSet<&str> = ds.rows.iter().map(|r| r.distrito.as_str()).collect();
    let year_min = ds.rows.iter().map(|r| r.ano).min();
    let year_max = ds.rows.iter().map(|r| r.ano).max();

    Ok(DatasetManifest {
        path: path.display().to_string(),
        hash_sha256: hash,
        row_count: ds.rows.len() as u64,
        bad_rows: ds.bad_rows,
        columns: header,
        departments: departments.len() as u64,
        provinces: provinces.len() as u64,
        districts: districts.len() as u64,
        year_min,
        year_max,
        generated_at_epoch: now_ts,
    })
}

pub fn file_sha256(path: &Path) -> Result<String, String> {
    let mut file = File::open(path).map_err(|e| e.to_string())?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|e| e.to_string())?;
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
        .unwrap_or("dataset.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_basic() {
        let f = write_csv(
            "departamento,provincia,distrito,ano,edad,sexo\n\
             PIURA,SULLANA,BELLAVISTA,2019,34,M\n\
             PIURA,PIURA,CASTILLA,2020,8,F\n",
        );
        let ds = load_csv(f.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.bad_rows(), 0);
        assert_eq!(ds.rows()[0].provincia, "SULLANA");
        assert_eq!(ds.rows()[1].sexo, Sex::F);
    }

    #[test]
    fn test_extra_columns_ignored_and_reordered() {
        let f = write_csv(
            "enfermedad,ano,sexo,edad,departamento,provincia,distrito,semana\n\
             DENGUE,2015,F,41,LIMA,LIMA,ATE,22\n",
        );
        let ds = load_csv(f.path()).unwrap();
        assert_eq!(ds.len(), 1);
        let r = &ds.rows()[0];
        assert_eq!(r.departamento, "LIMA");
        assert_eq!(r.ano, 2015);
        assert_eq!(r.edad, 41);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let f = write_csv("departamento,provincia,distrito,ano,edad\nPIURA,PIURA,PIURA,2019,30\n");
        let err = load_csv(f.path()).unwrap_err();
        assert!(err.contains("sexo"), "error was: {}", err);

        let report = validate_schema(f.path()).unwrap();
        assert!(!report.ok);
        assert_eq!(report.missing, vec!["sexo".to_string()]);
    }

    #[test]
    fn test_bad_rows_counted_not_fatal() {
        let f = write_csv(
            "departamento,provincia,distrito,ano,edad,sexo\n\
             PIURA,SULLANA,BELLAVISTA,2019,34,M\n\
             PIURA,SULLANA,BELLAVISTA,not_a_year,34,M\n\
             PIURA,SULLANA,BELLAVISTA,2019,34,X\n\
             short,row\n",
        );
        let ds = load_csv(f.path()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.bad_rows(), 3);
    }

    #[test]
    fn test_departments_sorted_distinct() {
        let f = write_csv(
            "departamento,provincia,distrito,ano,edad,sexo\n\
             PIURA,A,A,2019,1,M\n\
             LIMA,B,B,2019,2,F\n\
             PIURA,C,C,2019,3,M\n",
        );
        let ds = load_csv(f.path()).unwrap();
        assert_eq!(ds.departments(), vec!["LIMA".to_string(), "PIURA".to_string()]);
    }

    #[test]
    fn test_manifest_counts() {
        let f = write_csv(
            "departamento,provincia,distrito,ano,edad,sexo\n\
             PIURA,SULLANA,BELLAVISTA,2019,34,M\n\
             PIURA,PIURA,CASTILLA,2021,8,F\n\
             LIMA,LIMA,ATE,2020,50,F\n",
        );
        let manifest = analyze_csv(f.path(), 0).unwrap();
        assert_eq!(manifest.row_count, 3);
        assert_eq!(manifest.departments, 2);
        assert_eq!(manifest.provinces, 3);
        assert_eq!(manifest.year_min, Some(2019));
        assert_eq!(manifest.year_max, Some(2021));
        assert_eq!(manifest.hash_sha256.len(), 64);
    }

    #[test]
    fn test_sha256_reproducible() {
        let f = write_csv("departamento,provincia,distrito,ano,edad,sexo\n");
        let h1 = file_sha256(f.path()).unwrap();
        let h2 = file_sha256(f.path()).unwrap();
        assert_eq!(h1, h2);
    }
}
