//! File-backed save store.
//!
//! Each principal gets two JSON files in the store directory: the latest
//! game snapshot and the set of unlocked achievements.
//!
//! ```text
//! <dir>/<principal>.save.json
//! <dir>/<principal>.achievements.json
//! ```
//!
//! Writes go to a temporary file that is renamed over the target, so a save
//! either replaces the previous one completely or leaves it untouched.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use lcdtris_engine::{SaveStore, StoreError};
use log::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// The stored game of one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub principal: String,
    pub saved_at: DateTime<Utc>,
    /// Snapshot blob exactly as the game produced it.
    pub state: String,
}

/// Achievement codes of one principal with their first unlock time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub principal: String,
    pub unlocked: BTreeMap<String, DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens the store at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, principal: &str, kind: &str) -> PathBuf {
        self.dir.join(format!("{}.{kind}.json", file_stem(principal)))
    }

    /// Reads the full save record, including its timestamp.
    pub fn load_record(&self, principal: &str) -> Result<Option<SaveRecord>, StoreError> {
        read_json(&self.path_for(principal, "save"))
    }

    pub fn achievements(&self, principal: &str) -> Result<AchievementRecord, StoreError> {
        let record = read_json(&self.path_for(principal, "achievements"))?;
        Ok(record.unwrap_or_else(|| AchievementRecord {
            principal: principal.to_owned(),
            unlocked: BTreeMap::new(),
        }))
    }
}

impl SaveStore for FileStore {
    fn save(&mut self, principal: &str, blob: &str) -> Result<(), StoreError> {
        let record = SaveRecord {
            principal: principal.to_owned(),
            saved_at: Utc::now(),
            state: blob.to_owned(),
        };
        let path = self.path_for(principal, "save");
        write_json(&path, &record)?;
        debug!("wrote {}", path.display());
        Ok(())
    }

    fn load(&mut self, principal: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load_record(principal)?.map(|record| record.state))
    }

    fn unlock_achievement(&mut self, principal: &str, code: &str) -> Result<(), StoreError> {
        let mut record = self.achievements(principal)?;
        if record.unlocked.contains_key(code) {
            return Ok(());
        }
        record.unlocked.insert(code.to_owned(), Utc::now());
        write_json(&self.path_for(principal, "achievements"), &record)
    }
}

/// Maps a principal to a file name: ASCII alphanumerics, `-`, `_`, `@` and
/// non-leading `.` are kept, anything else becomes `%XX` per UTF-8 byte.
fn file_stem(principal: &str) -> String {
    let mut stem = String::with_capacity(principal.len());
    for byte in principal.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'@' => {
                stem.push(char::from(byte));
            }
            b'.' if !stem.is_empty() => stem.push('.'),
            _ => stem.push_str(&format!("%{byte:02X}")),
        }
    }
    stem
}

fn read_json<T>(path: &Path) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
{
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(serde_json::from_reader(BufReader::new(file))?))
}

fn write_json<T>(path: &Path, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
{
    let tmp_path = path.with_extension("json.tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
