//! On-disk index artifact.
//!
//! An artifact is a directory holding two files written by the same build:
//!
//! - `vectors.bin`: header (magic `RSTV`, format version, dimension, count,
//!   build id) followed by `count * dimension` little-endian `f32`
//! - `records.json`: the manifest fields plus the ordered record list
//!
//! Both files carry the build id. Loading checks that the two halves come from
//! the same build and agree on dimension and count; anything else is
//! [`VectorError::Corruption`].

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ulid::Ulid;

use roster_types::Record;

use crate::error::VectorError;
use crate::flat::FlatIndex;
use crate::index::VectorIndex;
use crate::store::IndexStore;

/// Vector file name inside an artifact directory
pub const VECTORS_FILE: &str = "vectors.bin";

/// Record file name inside an artifact directory
pub const RECORDS_FILE: &str = "records.json";

/// Current on-disk format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const MAGIC: &[u8; 4] = b"RSTV";
const HEADER_LEN: usize = 4 + 4 + 4 + 8 + 16;

/// Identity of one persisted build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub format_version: u32,
    /// ULID shared by both files of the artifact
    pub build_id: String,
    pub dimension: usize,
    pub count: usize,
    /// Embedding model that produced the vectors
    pub model: String,
    pub built_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct RecordsFileRef<'a> {
    #[serde(flatten)]
    manifest: &'a ArtifactManifest,
    records: &'a [Record],
}

#[derive(Deserialize)]
struct RecordsFile {
    #[serde(flatten)]
    manifest: ArtifactManifest,
    records: Vec<Record>,
}

struct VectorsHeader {
    format_version: u32,
    dimension: usize,
    count: u64,
    build_id: u128,
}

impl IndexStore {
    /// Persist this store as a new artifact in `dir`.
    ///
    /// Both files are written under temporary names first and renamed into
    /// place once complete, so a failed save never leaves a half-written file
    /// under the final names. The two renames are separate steps; a crash
    /// between them leaves files from different builds, which [`Self::load`]
    /// rejects through the shared build id.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<ArtifactManifest, VectorError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let build_id = Ulid::new();
        let manifest = ArtifactManifest {
            format_version: ARTIFACT_FORMAT_VERSION,
            build_id: build_id.to_string(),
            dimension: self.dimension(),
            count: self.len(),
            model: self.model().to_string(),
            built_at: Utc::now(),
        };

        let vectors_tmp = dir.join(format!("{}.tmp", VECTORS_FILE));
        let records_tmp = dir.join(format!("{}.tmp", RECORDS_FILE));

        write_vectors(&vectors_tmp, self.index(), build_id)?;
        write_records(&records_tmp, &manifest, self.records())?;

        fs::rename(&vectors_tmp, dir.join(VECTORS_FILE))?;
        fs::rename(&records_tmp, dir.join(RECORDS_FILE))?;

        info!(
            path = ?dir,
            build_id = %manifest.build_id,
            vectors = manifest.count,
            "Saved index artifact"
        );
        Ok(manifest)
    }

    /// Load the artifact in `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<(Self, ArtifactManifest), VectorError> {
        let dir = dir.as_ref();
        let (vectors_path, records_path) = artifact_paths(dir)?;

        let records_bytes = fs::read(&records_path)?;
        let records_file: RecordsFile = serde_json::from_slice(&records_bytes)
            .map_err(|e| VectorError::Corruption(format!("{}: {}", RECORDS_FILE, e)))?;
        let manifest = records_file.manifest;

        let vector_bytes = fs::read(&vectors_path)?;
        let header = parse_header(&vector_bytes)?;

        if header.format_version != ARTIFACT_FORMAT_VERSION
            || manifest.format_version != ARTIFACT_FORMAT_VERSION
        {
            return Err(VectorError::Corruption(format!(
                "unsupported format version (vectors {}, records {})",
                header.format_version, manifest.format_version
            )));
        }

        let manifest_build_id = Ulid::from_string(&manifest.build_id)
            .map_err(|e| VectorError::Corruption(format!("invalid build id: {}", e)))?;
        if manifest_build_id.0 != header.build_id {
            return Err(VectorError::Corruption(format!(
                "{} and {} come from different builds ({} vs {})",
                VECTORS_FILE,
                RECORDS_FILE,
                Ulid(header.build_id),
                manifest.build_id
            )));
        }

        if header.dimension != manifest.dimension {
            return Err(VectorError::Corruption(format!(
                "dimension {} in {} but {} in {}",
                header.dimension, VECTORS_FILE, manifest.dimension, RECORDS_FILE
            )));
        }

        let count = usize::try_from(header.count)
            .map_err(|_| VectorError::Corruption(format!("vector count {} too large", header.count)))?;
        if count != manifest.count || count != records_file.records.len() {
            return Err(VectorError::Corruption(format!(
                "{} vectors, manifest says {}, {} records present",
                count,
                manifest.count,
                records_file.records.len()
            )));
        }

        let values = decode_values(&vector_bytes[HEADER_LEN..], count, header.dimension)?;
        let index = FlatIndex::from_raw(header.dimension, values)?;
        let store = IndexStore::from_parts(index, records_file.records, manifest.model.clone())?;

        info!(
            path = ?dir,
            build_id = %manifest.build_id,
            vectors = store.len(),
            "Loaded index artifact"
        );
        Ok((store, manifest))
    }
}

/// Read only the manifest of the artifact in `dir`.
pub fn read_manifest(dir: impl AsRef<Path>) -> Result<ArtifactManifest, VectorError> {
    let (_, records_path) = artifact_paths(dir.as_ref())?;
    let bytes = fs::read(&records_path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| VectorError::Corruption(format!("{}: {}", RECORDS_FILE, e)))
}

fn artifact_paths(dir: &Path) -> Result<(PathBuf, PathBuf), VectorError> {
    let vectors_path = dir.join(VECTORS_FILE);
    let records_path = dir.join(RECORDS_FILE);

    match (vectors_path.exists(), records_path.exists()) {
        (true, true) => Ok((vectors_path, records_path)),
        (false, false) => Err(VectorError::NotFound(dir.display().to_string())),
        (true, false) => Err(VectorError::Corruption(format!(
            "{} present without {}",
            VECTORS_FILE, RECORDS_FILE
        ))),
        (false, true) => Err(VectorError::Corruption(format!(
            "{} present without {}",
            RECORDS_FILE, VECTORS_FILE
        ))),
    }
}

fn write_vectors(path: &Path, index: &FlatIndex, build_id: Ulid) -> Result<(), VectorError> {
    let dimension = u32::try_from(index.dimension()).map_err(|_| {
        VectorError::Serialization(format!("dimension {} too large", index.dimension()))
    })?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(MAGIC)?;
    writer.write_all(&ARTIFACT_FORMAT_VERSION.to_le_bytes())?;
    writer.write_all(&dimension.to_le_bytes())?;
    writer.write_all(&(index.len() as u64).to_le_bytes())?;
    writer.write_all(&build_id.0.to_le_bytes())?;
    for value in index.as_slice() {
        writer.write_all(&value.to_le_bytes())?;
    }

    let file = writer
        .into_inner()
        .map_err(|e| VectorError::Io(e.into_error()))?;
    file.sync_all()?;

    debug!(path = ?path, vectors = index.len(), "Wrote vector file");
    Ok(())
}

fn write_records(
    path: &Path,
    manifest: &ArtifactManifest,
    records: &[Record],
) -> Result<(), VectorError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, &RecordsFileRef { manifest, records })
        .map_err(|e| VectorError::Serialization(e.to_string()))?;

    let file = writer
        .into_inner()
        .map_err(|e| VectorError::Io(e.into_error()))?;
    file.sync_all()?;

    debug!(path = ?path, records = records.len(), "Wrote record file");
    Ok(())
}

fn parse_header(bytes: &[u8]) -> Result<VectorsHeader, VectorError> {
    if bytes.len() < HEADER_LEN {
        return Err(VectorError::Corruption(format!(
            "{} is {} bytes, shorter than its header",
            VECTORS_FILE,
            bytes.len()
        )));
    }
    if &bytes[0..4] != MAGIC {
        return Err(VectorError::Corruption(format!(
            "{} has a bad magic number",
            VECTORS_FILE
        )));
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[4..8]);
    let mut dimension = [0u8; 4];
    dimension.copy_from_slice(&bytes[8..12]);
    let mut count = [0u8; 8];
    count.copy_from_slice(&bytes[12..20]);
    let mut build_id = [0u8; 16];
    build_id.copy_from_slice(&bytes[20..36]);

    Ok(VectorsHeader {
        format_version: u32::from_le_bytes(version),
        dimension: u32::from_le_bytes(dimension) as usize,
        count: u64::from_le_bytes(count),
        build_id: u128::from_le_bytes(build_id),
    })
}

fn decode_values(payload: &[u8], count: usize, dimension: usize) -> Result<Vec<f32>, VectorError> {
    let expected = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
        .ok_or_else(|| VectorError::Corruption("vector payload size overflows".to_string()))?;

    if payload.len() != expected {
        return Err(VectorError::Corruption(format!(
            "vector payload is {} bytes, expected {}",
            payload.len(),
            expected
        )));
    }

    Ok(payload
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
