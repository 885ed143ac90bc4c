// File: src/persistence.rs
use crate::config::EngineConfig;
use crate::core::dictionary::DrugDictionary;
use crate::error::{Result, RxError};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::UNIX_EPOCH;
use tempfile::NamedTempFile;

const SNAPSHOT_VERSION: u32 = 2;

/// Identifies the CSV a snapshot was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct SourceFingerprint {
    len: u64,
    modified_secs: u64,
    modified_nanos: u32,
}

impl SourceFingerprint {
    fn of(source: &Path) -> Result<Self> {
        let metadata = fs::metadata(source)?;
        let modified = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Ok(Self {
            len: metadata.len(),
            modified_secs: modified.as_secs(),
            modified_nanos: modified.subsec_nanos(),
        })
    }
}

/// The configuration a dictionary was indexed under. A snapshot built with
/// other settings has a different index shape and must be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct BuildSettings {
    max_edit_distance: usize,
    prefix_length: usize,
    name_column: String,
}

impl BuildSettings {
    fn of(config: &EngineConfig) -> Self {
        Self {
            max_edit_distance: config.max_edit_distance,
            prefix_length: config.prefix_length,
            name_column: config.name_column.clone(),
        }
    }
}

/// Field order must match `Snapshot`; bincode is positional.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    source: SourceFingerprint,
    settings: BuildSettings,
    dictionary: &'a DrugDictionary,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    source: SourceFingerprint,
    settings: BuildSettings,
    dictionary: DrugDictionary,
}

/// Writes a snapshot of a dictionary built from `config.dictionary_path`.
/// The data goes to a temporary file in the destination directory which is
/// then atomically moved into place.
pub fn save_snapshot(dictionary: &DrugDictionary, config: &EngineConfig, path: &Path) -> Result<()> {
    let parent_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir)?;

    let state = SnapshotRef {
        version: SNAPSHOT_VERSION,
        source: SourceFingerprint::of(&config.dictionary_path)?,
        settings: BuildSettings::of(config),
        dictionary,
    };

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, &state)?;
        writer.flush()?;
    }

    temp_file.persist(path).map_err(|e| RxError::Io(e.error))?;
    tracing::info!(path = %path.display(), keys = dictionary.len(), "dictionary snapshot written");
    Ok(())
}

/// Reads a snapshot, rejecting it if it was written by an incompatible
/// format, built from a different version of `config.dictionary_path`, or
/// indexed under different settings.
pub fn load_snapshot(config: &EngineConfig, path: &Path) -> Result<DrugDictionary> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: Snapshot = bincode::deserialize_from(reader)?;

    if snapshot.version != SNAPSHOT_VERSION
        || snapshot.source != SourceFingerprint::of(&config.dictionary_path)?
        || snapshot.settings != BuildSettings::of(config)
    {
        return Err(RxError::StaleSnapshot);
    }
    Ok(snapshot.dictionary)
}
