//! On-disk persistence of an ingested snapshot.
//!
//! Two files per snapshot directory:
//! - `corpus.json` — records plus a manifest (count, dimension, saved_at)
//! - `embeddings.bin` — row-major little-endian f32 matrix
//!
//! Persistence is a consumer concern: the CLI uses this module so an
//! ingested corpus survives across invocations without re-embedding.
//! The engine itself never touches the filesystem.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::corpus::QaRecord;
use crate::engine::Snapshot;
use crate::errors::{EngineError, Result};

pub const CORPUS_FILE: &str = "corpus.json";
pub const EMBEDDINGS_FILE: &str = "embeddings.bin";

#[derive(Debug, Serialize, Deserialize)]
struct CorpusManifest {
    dimension: usize,
    count: usize,
    saved_at: DateTime<Utc>,
    records: Vec<QaRecord>,
}

/// A snapshot read back from disk, ready for `QaEngine::restore`.
#[derive(Debug)]
pub struct LoadedSnapshot {
    pub records: Vec<QaRecord>,
    pub embeddings: Vec<Vec<f32>>,
    pub dimension: usize,
    pub saved_at: DateTime<Utc>,
}

/// Whether `dir` holds both snapshot files.
pub fn exists(dir: &Path) -> bool {
    dir.join(CORPUS_FILE).exists() && dir.join(EMBEDDINGS_FILE).exists()
}

/// Write the snapshot into `dir`, creating it if needed.
pub fn save(dir: &Path, snapshot: &Snapshot) -> Result<()> {
    fs::create_dir_all(dir)?;

    let manifest = CorpusManifest {
        dimension: snapshot.index().dimension(),
        count: snapshot.store().len(),
        saved_at: Utc::now(),
        records: snapshot.store().records().to_vec(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(dir.join(CORPUS_FILE), json)?;

    let mut blob = Vec::with_capacity(manifest.count * manifest.dimension * 4);
    for row in snapshot.index().rows() {
        for value in row {
            blob.extend_from_slice(&value.to_le_bytes());
        }
    }
    fs::write(dir.join(EMBEDDINGS_FILE), blob)?;

    Ok(())
}

/// Read a snapshot back from `dir`, validating alignment before the
/// engine ever sees it.
pub fn load(dir: &Path) -> Result<LoadedSnapshot> {
    let manifest_path = dir.join(CORPUS_FILE);
    if !manifest_path.exists() {
        return Err(EngineError::Snapshot(format!(
            "no snapshot found in {}",
            dir.display()
        )));
    }

    let manifest: CorpusManifest = serde_json::from_str(&fs::read_to_string(&manifest_path)?)?;
    if manifest.dimension == 0 {
        return Err(EngineError::Snapshot(
            "manifest declares dimension 0".to_string(),
        ));
    }
    if manifest.records.len() != manifest.count {
        return Err(EngineError::Snapshot(format!(
            "{} records but manifest declares {}",
            manifest.records.len(),
            manifest.count
        )));
    }

    let blob = fs::read(dir.join(EMBEDDINGS_FILE))?;
    let expected = manifest.count * manifest.dimension * 4;
    if blob.len() != expected {
        return Err(EngineError::Snapshot(format!(
            "embeddings file is {} bytes (expected {})",
            blob.len(),
            expected
        )));
    }

    let values: Vec<f32> = blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    let embeddings = values
        .chunks_exact(manifest.dimension)
        .map(|row| row.to_vec())
        .collect();

    Ok(LoadedSnapshot {
        records: manifest.records,
        embeddings,
        dimension: manifest.dimension,
        saved_at: manifest.saved_at,
    })
}
