use crate::domain::models::SessionUser;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::key_value_store::KeyValueStore;
use std::sync::Arc;

pub const SESSION_USER_KEY: &str = "user";

/// Local sign-in session. There is no identity provider behind it; the user
/// record is simply remembered until sign-out.
pub struct SessionStore<K>
where
    K: KeyValueStore + ?Sized,
{
    storage: Arc<K>,
}

impl<K> SessionStore<K>
where
    K: KeyValueStore + ?Sized,
{
    pub fn new(storage: Arc<K>) -> Self {
        Self { storage }
    }

    pub fn current_user(&self) -> Result<Option<SessionUser>, InfraError> {
        let Some(raw) = self.storage.get_item(SESSION_USER_KEY)? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    pub fn sign_in(&self, user: &SessionUser) -> Result<(), InfraError> {
        user.validate().map_err(InfraError::InvalidInput)?;
        let encoded = serde_json::to_string(user)?;
        self.storage.set_item(SESSION_USER_KEY, &encoded)
    }

    pub fn sign_out(&self) -> Result<(), InfraError> {
        self.storage.remove_item(SESSION_USER_KEY)
    }
}
