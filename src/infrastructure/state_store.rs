use crate::domain::app_state::AppState;
use crate::domain::models::{Credential, Routine, ThemeMode, UserProfile};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::key_value_store::KeyValueStore;
use std::sync::Arc;

pub const APP_STATE_KEY: &str = "routine-planner-app-state";

/// Local State Store. Every scoped helper is a full read-modify-write of the
/// single document. Writers in other processes are not coordinated; the last
/// write wins.
pub struct StateStore<K>
where
    K: KeyValueStore + ?Sized,
{
    storage: Arc<K>,
}

impl<K> Clone for StateStore<K>
where
    K: KeyValueStore + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<K> StateStore<K>
where
    K: KeyValueStore + ?Sized,
{
    pub fn new(storage: Arc<K>) -> Self {
        Self { storage }
    }

    /// Strict read: an unparsable document is reported as `StorageCorrupt`.
    pub fn read(&self) -> Result<Option<AppState>, InfraError> {
        let Some(raw) = self.storage.get_item(APP_STATE_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str::<AppState>(&raw)
            .map(Some)
            .map_err(|error| InfraError::StorageCorrupt(error.to_string()))
    }

    /// Lenient read: a corrupt document is treated as absent.
    pub fn load(&self) -> Result<Option<AppState>, InfraError> {
        match self.read() {
            Err(InfraError::StorageCorrupt(_)) => Ok(None),
            other => other,
        }
    }

    pub fn load_or_default(&self) -> Result<AppState, InfraError> {
        Ok(self.load()?.unwrap_or_default())
    }

    pub fn save(&self, state: &AppState) -> Result<(), InfraError> {
        let encoded = serde_json::to_string(state)?;
        self.storage.set_item(APP_STATE_KEY, &encoded)
    }

    pub fn clear(&self) -> Result<(), InfraError> {
        self.storage.remove_item(APP_STATE_KEY)
    }

    /// Loads (or defaults), applies `change`, writes the whole document back
    /// and returns the persisted state.
    pub fn update<T>(&self, change: impl FnOnce(&mut AppState) -> T) -> Result<(AppState, T), InfraError> {
        let mut state = self.load_or_default()?;
        let output = change(&mut state);
        self.save(&state)?;
        Ok((state, output))
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<AppState, InfraError> {
        self.update(|state| state.set_profile(profile.clone()))
            .map(|(state, _)| state)
    }

    pub fn save_credential(&self, credential: &Credential) -> Result<AppState, InfraError> {
        self.update(|state| state.set_credential(credential.clone()))
            .map(|(state, _)| state)
    }

    pub fn clear_credential(&self) -> Result<AppState, InfraError> {
        self.update(AppState::clear_credential).map(|(state, _)| state)
    }

    pub fn save_routine(&self, routine: &Routine) -> Result<AppState, InfraError> {
        self.update(|state| state.upsert_routine(routine.clone()))
            .map(|(state, _)| state)
    }

    pub fn save_theme_mode(&self, theme_mode: ThemeMode) -> Result<AppState, InfraError> {
        self.update(|state| state.set_theme_mode(theme_mode))
            .map(|(state, _)| state)
    }

    pub fn update_todo(
        &self,
        routine_id: &str,
        todo_id: &str,
        completed: bool,
    ) -> Result<(AppState, bool), InfraError> {
        self.update(|state| state.set_todo_completed(routine_id, todo_id, completed))
    }

    pub fn set_current_routine(&self, routine_id: &str) -> Result<(AppState, bool), InfraError> {
        self.update(|state| state.set_current_routine(routine_id))
    }

    pub fn delete_routine(&self, routine_id: &str) -> Result<(AppState, Option<Routine>), InfraError> {
        self.update(|state| state.delete_routine(routine_id))
    }
}
