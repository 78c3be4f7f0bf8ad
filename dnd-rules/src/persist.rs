//! Save and load characters and encounters as JSON.

use crate::character::Character;
use crate::encounter::Encounter;
use crate::store::{CharacterStore, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

fn check_version(found: u32) -> Result<(), PersistError> {
    if found != SAVE_VERSION {
        return Err(PersistError::VersionMismatch {
            expected: SAVE_VERSION,
            found,
        });
    }
    Ok(())
}

// ============================================================================
// Table Snapshot
// ============================================================================

/// Every character and encounter at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTable {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created (seconds since the Unix epoch).
    pub saved_at: String,

    pub characters: Vec<Character>,

    #[serde(default)]
    pub encounters: Vec<Encounter>,
}

impl SavedTable {
    pub fn new(characters: Vec<Character>, encounters: Vec<Encounter>) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: chrono_now(),
            characters,
            encounters,
        }
    }

    /// Snapshot the store's characters alongside `encounters`.
    pub async fn from_store(store: &CharacterStore, encounters: Vec<Encounter>) -> Self {
        Self::new(store.list().await, encounters)
    }

    /// Create every saved character in `store`.
    pub async fn restore_into(&self, store: &CharacterStore) -> Result<(), PersistError> {
        for character in &self.characters {
            store.create(character.clone()).await?;
        }
        Ok(())
    }

    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        debug!(
            characters = self.characters.len(),
            encounters = self.encounters.len(),
            "table saved"
        );
        Ok(())
    }

    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;
        check_version(saved.version)?;
        Ok(saved)
    }
}

// ============================================================================
// Character Files
// ============================================================================

/// A single character saved for reuse across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCharacter {
    pub version: u32,
    pub saved_at: String,
    pub character: Character,
}

impl SavedCharacter {
    pub fn new(character: Character) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: chrono_now(),
            character,
        }
    }

    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;
        check_version(saved.version)?;
        Ok(saved)
    }
}

/// File name for a character save.
pub fn character_save_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    let sanitized = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    dir.as_ref().join(format!("{sanitized}.json"))
}

/// Save each character to its own file in `dir`, concurrently.
pub async fn save_characters(
    dir: impl AsRef<Path>,
    characters: &[Character],
) -> Result<Vec<PathBuf>, PersistError> {
    let dir = dir.as_ref();
    let writes = characters.iter().map(|character| async move {
        let path = character_save_path(dir, &character.name);
        SavedCharacter::new(character.clone()).save_json(&path).await?;
        Ok::<_, PersistError>(path)
    });
    futures::future::try_join_all(writes).await
}

/// Load every readable character save in `dir`, sorted by name. Files that
/// fail to parse are skipped.
pub async fn load_characters(dir: impl AsRef<Path>) -> Result<Vec<Character>, PersistError> {
    let mut characters = Vec::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "json") {
            match SavedCharacter::load_json(&path).await {
                Ok(saved) => characters.push(saved.character),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping save"),
            }
        }
    }

    characters.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(characters)
}

/// Current time as seconds since the Unix epoch.
fn chrono_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", now.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ActiveEffect;
    use crate::encounter::Combatant;
    use crate::testing::{sample_fighter, sample_monk};
    use tempfile::TempDir;

    #[test]
    fn test_character_save_path() {
        let path = character_save_path("/saves", "Sir Roland");
        assert_eq!(path, PathBuf::from("/saves/Sir_Roland.json"));
    }

    #[tokio::test]
    async fn test_table_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("table.json");

        let mut fighter = sample_fighter();
        fighter.resources.add_effect(ActiveEffect::bless());
        let mut encounter = Encounter::default();
        encounter
            .add_combatant(Combatant::from_character(&fighter))
            .unwrap();
        encounter.add_combat_log_entry("The fight begins");

        let table = SavedTable::new(vec![fighter, sample_monk()], vec![encounter]);
        table.save_json(&path).await.unwrap();

        let loaded = SavedTable::load_json(&path).await.unwrap();
        assert_eq!(loaded, table);
    }

    #[tokio::test]
    async fn test_version_mismatch() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("old.json");

        let mut table = SavedTable::new(Vec::new(), Vec::new());
        table.version = 99;
        table.save_json(&path).await.unwrap();

        assert!(matches!(
            SavedTable::load_json(&path).await,
            Err(PersistError::VersionMismatch {
                expected: 1,
                found: 99
            })
        ));
    }

    #[tokio::test]
    async fn test_store_round_trip() {
        let store = CharacterStore::new();
        let id = store.create(sample_fighter()).await.unwrap();

        let table = SavedTable::from_store(&store, Vec::new()).await;
        let restored = CharacterStore::new();
        table.restore_into(&restored).await.unwrap();
        assert_eq!(restored.get(id).await.unwrap(), store.get(id).await.unwrap());

        assert!(matches!(
            table.restore_into(&restored).await,
            Err(PersistError::Store(StoreError::AlreadyExists(_)))
        ));
    }

    #[tokio::test]
    async fn test_save_and_load_characters() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let characters = vec![sample_monk(), sample_fighter()];

        let paths = save_characters(temp_dir.path(), &characters).await.unwrap();
        assert_eq!(paths.len(), 2);

        fs::write(temp_dir.path().join("junk.json"), "not json")
            .await
            .unwrap();

        let loaded = load_characters(temp_dir.path()).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.windows(2).all(|w| w[0].name <= w[1].name));
    }
}
