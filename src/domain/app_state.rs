use crate::domain::models::{Credential, Routine, ThemeMode, UserProfile};
use serde::{Deserialize, Serialize};

/// Root aggregate. Every mutation is applied to a whole value and persisted as
/// one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub profile: Option<UserProfile>,
    pub credential: Option<Credential>,
    pub routines: Vec<Routine>,
    pub current_routine_id: Option<String>,
    pub is_onboarded: bool,
    pub theme_mode: ThemeMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced { index: usize },
}

impl AppState {
    /// The current routine; a dangling id reads as none.
    pub fn current_routine(&self) -> Option<&Routine> {
        let id = self.current_routine_id.as_deref()?;
        self.routine(id)
    }

    pub fn routine(&self, routine_id: &str) -> Option<&Routine> {
        self.routines.iter().find(|routine| routine.id == routine_id)
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
        self.is_onboarded = true;
    }

    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    pub fn clear_credential(&mut self) {
        self.credential = None;
    }

    pub fn set_theme_mode(&mut self, theme_mode: ThemeMode) {
        self.theme_mode = theme_mode;
    }

    /// Replaces the routine with the same id in place, or appends it. Either
    /// way the routine becomes current.
    pub fn upsert_routine(&mut self, routine: Routine) -> UpsertOutcome {
        let routine_id = routine.id.clone();
        let outcome = match self
            .routines
            .iter()
            .position(|candidate| candidate.id == routine.id)
        {
            Some(index) => {
                self.routines[index] = routine;
                UpsertOutcome::Replaced { index }
            }
            None => {
                self.routines.push(routine);
                UpsertOutcome::Inserted
            }
        };
        self.current_routine_id = Some(routine_id);
        outcome
    }

    /// Returns false and leaves the state untouched when the routine or todo
    /// does not exist.
    pub fn set_todo_completed(&mut self, routine_id: &str, todo_id: &str, completed: bool) -> bool {
        let Some(routine) = self
            .routines
            .iter_mut()
            .find(|routine| routine.id == routine_id)
        else {
            return false;
        };
        let Some(todo) = routine.todos.iter_mut().find(|todo| todo.id == todo_id) else {
            return false;
        };
        todo.completed = completed;
        true
    }

    pub fn set_current_routine(&mut self, routine_id: &str) -> bool {
        if self.routine(routine_id).is_none() {
            return false;
        }
        self.current_routine_id = Some(routine_id.to_string());
        true
    }

    pub fn delete_routine(&mut self, routine_id: &str) -> Option<Routine> {
        let index = self
            .routines
            .iter()
            .position(|routine| routine.id == routine_id)?;
        let removed = self.routines.remove(index);
        if self.current_routine_id.as_deref() == Some(routine_id) {
            self.current_routine_id = None;
        }
        Some(removed)
    }

    /// "Delete all todos" of the current routine: the routine itself goes away
    /// and nothing is current afterwards.
    pub fn delete_current_routine(&mut self) -> Option<Routine> {
        let current_id = self.current_routine_id.take()?;
        self.delete_routine(&current_id)
    }

    pub fn toggle_theme(&mut self) -> ThemeMode {
        self.theme_mode = self.theme_mode.toggled();
        self.theme_mode
    }
}
