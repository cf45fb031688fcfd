//! One checksummed binary file per user.
//!
//! File format:
//! - Version magic (8 bytes)
//! - Payload length (4 bytes)
//! - bincode payload: user id + progression
//! - SHA-256 over the three fields above (32 bytes)

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::ProgressionStore;
use crate::character::progression::PlayerProgression;
use crate::core::constants::{DATA_DIR_NAME, SAVE_VERSION_MAGIC};
use crate::core::error::{GameError, Result, StorageError};
use crate::core::game_state::UserId;

const SAVE_EXTENSION: &str = "sav";
const HEADER_LEN: usize = 8 + 4;
const CHECKSUM_LEN: usize = 32;

#[derive(Serialize, Deserialize)]
struct SaveRecord {
    user_id: UserId,
    progression: PlayerProgression,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(StorageError::from)?;
        Ok(Self { dir })
    }

    /// `~/.idlebattle/`
    pub fn default_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            StorageError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine home directory",
            ))
        })?;
        Ok(home.join(DATA_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, user: &UserId) -> PathBuf {
        let stem: String = user
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.{}", stem, SAVE_EXTENSION))
    }

    fn read_record(path: &Path) -> std::result::Result<SaveRecord, StorageError> {
        let bytes = fs::read(path)?;
        decode(&bytes)
    }
}

/// Frame a record in the save format.
fn encode(record: &SaveRecord) -> std::result::Result<Vec<u8>, StorageError> {
    let data = bincode::serialize(record)?;
    let data_len = u32::try_from(data.len())
        .map_err(|_| StorageError::Serialization("record too large".to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(SAVE_VERSION_MAGIC.to_le_bytes());
    hasher.update(data_len.to_le_bytes());
    hasher.update(&data);
    let checksum = hasher.finalize();

    let mut out = Vec::with_capacity(HEADER_LEN + data.len() + CHECKSUM_LEN);
    out.extend_from_slice(&SAVE_VERSION_MAGIC.to_le_bytes());
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(&data);
    out.extend_from_slice(&checksum);
    Ok(out)
}

fn decode(bytes: &[u8]) -> std::result::Result<SaveRecord, StorageError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(StorageError::Corrupt("file truncated".to_string()));
    }

    let (magic_bytes, rest) = bytes.split_at(8);
    let (length_bytes, rest) = rest.split_at(4);
    let mut magic = [0u8; 8];
    magic.copy_from_slice(magic_bytes);
    let version = u64::from_le_bytes(magic);
    if version != SAVE_VERSION_MAGIC {
        return Err(StorageError::Corrupt(format!(
            "invalid save version: expected 0x{:016X}, got 0x{:016X}",
            SAVE_VERSION_MAGIC, version
        )));
    }

    let mut length = [0u8; 4];
    length.copy_from_slice(length_bytes);
    let data_len = u32::from_le_bytes(length) as usize;
    if rest.len() != data_len + CHECKSUM_LEN {
        return Err(StorageError::Corrupt("length mismatch".to_string()));
    }
    let (data, stored_checksum) = rest.split_at(data_len);

    let mut hasher = Sha256::new();
    hasher.update(magic_bytes);
    hasher.update(length_bytes);
    hasher.update(data);
    if hasher.finalize().as_slice() != stored_checksum {
        return Err(StorageError::Corrupt(
            "checksum verification failed".to_string(),
        ));
    }

    Ok(bincode::deserialize(data)?)
}

impl ProgressionStore for FileStore {
    fn load(&self, user: &UserId) -> Result<PlayerProgression> {
        let path = self.path_for(user);
        if !path.exists() {
            return Err(GameError::NotFound(user.clone()));
        }
        let record = Self::read_record(&path)?;
        Ok(record.progression)
    }

    /// Write to a temp file, then rename over the old save.
    fn save(&self, user: &UserId, progression: &PlayerProgression) -> Result<()> {
        let bytes = encode(&SaveRecord {
            user_id: user.clone(),
            progression: progression.clone(),
        })?;

        let path = self.path_for(user);
        let tmp = path.with_extension("tmp");
        let write = || -> std::result::Result<(), StorageError> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)?;
            Ok(())
        };
        write()?;

        debug!(user = %user, path = %path.display(), "saved progression");
        Ok(())
    }

    fn list(&self) -> Result<Vec<(UserId, PlayerProgression)>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(StorageError::from)? {
            let path = entry.map_err(StorageError::from)?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            match Self::read_record(&path) {
                Ok(record) => records.push((record.user_id, record.progression)),
                Err(err) => warn!(path = %path.display(), "skipping unreadable save: {}", err),
            }
        }
        Ok(records)
    }
}
