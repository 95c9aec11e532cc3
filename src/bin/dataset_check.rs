use denguewatch::dataset::{
    analyze_csv, default_manifest_path, validate_schema, REQUIRED_COLUMNS,
};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let path = env::args()
        .nth(1)
        .or_else(|| env::var("DATASET_PATH").ok())
        .unwrap_or_else(|| "data/datos_abiertos_vigilancia_dengue_2000_2023.csv".to_string());

    let now_ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let schema = match validate_schema(PathBuf::from(&path).as_path()) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("schema check failed: {}", err);
            std::process::exit(1);
        }
    };

    if !schema.ok {
        eprintln!("schema mismatch: {}", schema.message);
        eprintln!("required columns: {:?}", REQUIRED_COLUMNS);
        std::process::exit(2);
    }

    let manifest = match analyze_csv(PathBuf::from(&path).as_path(), now_ts) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("analysis failed: {}", err);
            std::process::exit(3);
        }
    };

    let out_path = default_manifest_path(PathBuf::from(&path).as_path());
    if let Err(err) = fs::write(
        &out_path,
        serde_json::to_string_pretty(&manifest).expect("manifest serializes"),
    ) {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(4);
    }
    println!("wrote manifest {}", out_path.display());
}
