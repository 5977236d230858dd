use crate::domain::models::NewsItem;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::key_value_store::KeyValueStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const NEWS_CACHE_KEY: &str = "financial-news-cache";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsCacheDocument {
    pub fetched_at: DateTime<Utc>,
    pub items: Vec<NewsItem>,
}

impl NewsCacheDocument {
    /// Fresh while strictly younger than `max_age`. A `fetched_at` in the
    /// future (clock skew) also counts as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < max_age
    }
}

pub struct NewsCache<K>
where
    K: KeyValueStore + ?Sized,
{
    storage: Arc<K>,
}

impl<K> NewsCache<K>
where
    K: KeyValueStore + ?Sized,
{
    pub fn new(storage: Arc<K>) -> Self {
        Self { storage }
    }

    /// An unreadable cache entry is treated as a miss.
    pub fn load(&self) -> Result<Option<NewsCacheDocument>, InfraError> {
        let Some(raw) = self.storage.get_item(NEWS_CACHE_KEY)? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    pub fn store(&self, document: &NewsCacheDocument) -> Result<(), InfraError> {
        let encoded = serde_json::to_string(document)?;
        self.storage.set_item(NEWS_CACHE_KEY, &encoded)
    }

    pub fn clear(&self) -> Result<(), InfraError> {
        self.storage.remove_item(NEWS_CACHE_KEY)
    }
}
