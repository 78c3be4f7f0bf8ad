//! In-memory character storage.
//!
//! Every read hands out an owned copy, so a caller mutating its copy can
//! never be observed by another caller mid-update. Read-modify-write
//! sequences go through [`CharacterStore::modify`] or a [`SharedCharacter`].

use crate::character::{Character, CharacterId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Character not found: {0}")]
    NotFound(CharacterId),

    #[error("Character already exists: {0}")]
    AlreadyExists(CharacterId),
}

/// Copy-on-read character repository. Cloning the store shares the data.
#[derive(Debug, Clone, Default)]
pub struct CharacterStore {
    characters: Arc<RwLock<HashMap<CharacterId, Character>>>,
}

impl CharacterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: CharacterId) -> Result<Character, StoreError> {
        self.characters
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    pub async fn create(&self, character: Character) -> Result<CharacterId, StoreError> {
        let mut characters = self.characters.write().await;
        let id = character.id;
        if characters.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        debug!(%id, name = %character.name, "character stored");
        characters.insert(id, character);
        Ok(id)
    }

    /// Replace a stored character with `character`.
    pub async fn update(&self, character: Character) -> Result<(), StoreError> {
        let mut characters = self.characters.write().await;
        match characters.get_mut(&character.id) {
            Some(slot) => {
                *slot = character;
                Ok(())
            }
            None => Err(StoreError::NotFound(character.id)),
        }
    }

    pub async fn delete(&self, id: CharacterId) -> Result<Character, StoreError> {
        let removed = self
            .characters
            .write()
            .await
            .remove(&id)
            .ok_or(StoreError::NotFound(id))?;
        debug!(%id, "character deleted");
        Ok(removed)
    }

    /// Apply `f` to the stored character under the write lock and return
    /// its result.
    pub async fn modify<R>(
        &self,
        id: CharacterId,
        f: impl FnOnce(&mut Character) -> R,
    ) -> Result<R, StoreError> {
        let mut characters = self.characters.write().await;
        let character = characters.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        Ok(f(character))
    }

    /// Copies of every character, sorted by name.
    pub async fn list(&self) -> Vec<Character> {
        let mut all: Vec<Character> = self.characters.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub async fn len(&self) -> usize {
        self.characters.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.characters.read().await.is_empty()
    }
}

/// A single character behind an exclusive lock, for callers that need a
/// consistent read-then-write sequence (equip, then recompute AC).
///
/// The closure passed to [`SharedCharacter::with_lock`] is synchronous, so
/// the lock is never held across I/O.
#[derive(Debug, Clone)]
pub struct SharedCharacter(Arc<Mutex<Character>>);

impl SharedCharacter {
    pub fn new(character: Character) -> Self {
        Self(Arc::new(Mutex::new(character)))
    }

    pub async fn with_lock<R>(&self, f: impl FnOnce(&mut Character) -> R) -> R {
        let mut guard = self.0.lock().await;
        f(&mut guard)
    }

    /// An owned copy of the current state.
    pub async fn snapshot(&self) -> Character {
        self.0.lock().await.clone()
    }
}
