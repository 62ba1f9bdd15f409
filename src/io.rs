//! Run-output writers: response documents, raw samples, and the manifest
//! describing what produced them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;

pub const OUTPUT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub schema_version: String,
    pub mode: String,
    pub seed: Option<u64>,
    pub iterations: Option<usize>,
    pub note: String,
}

pub fn ensure_outdir(outdir: &Path) -> Result<()> {
    fs::create_dir_all(outdir)
        .with_context(|| format!("failed to create output directory: {}", outdir.display()))
}

pub fn write_samples_csv(path: &Path, samples: &[f64]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to open samples csv for writing: {}", path.display()))?;

    wtr.write_record(["iteration", "outcome", "schema_version"])?;
    for (i, sample) in samples.iter().enumerate() {
        wtr.write_record([
            &i.to_string(),
            &format!("{sample:.10}"),
            OUTPUT_SCHEMA_VERSION,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, payload).with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_manifest_json(outdir: &Path, manifest: &Manifest) -> Result<PathBuf> {
    let path = outdir.join("manifest.json");
    write_json(&path, manifest)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{write_manifest_json, write_samples_csv, Manifest, OUTPUT_SCHEMA_VERSION};

    #[test]
    fn samples_csv_has_one_row_per_iteration() {
        let dir = std::env::temp_dir().join("risk-mc-io-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("samples.csv");

        write_samples_csv(&path, &[1.0, 2.5, 3.25]).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 4);
        assert!(raw.starts_with("iteration,outcome,schema_version"));
    }

    #[test]
    fn manifest_round_trips_as_json() {
        let dir = std::env::temp_dir().join("risk-mc-io-test");
        std::fs::create_dir_all(&dir).unwrap();

        let path = write_manifest_json(
            &dir,
            &Manifest {
                schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
                mode: "simulate".to_string(),
                seed: Some(42),
                iterations: Some(10_000),
                note: "test".to_string(),
            },
        )
        .unwrap();

        let raw = std::fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["seed"], 42);
        assert_eq!(value["mode"], "simulate");
    }
}
