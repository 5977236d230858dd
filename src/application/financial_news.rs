use crate::application::ai_service::{AiService, NowProvider};
use crate::domain::models::NewsItem;
use crate::infrastructure::ai_provider_client::AiProviderClient;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::key_value_store::KeyValueStore;
use crate::infrastructure::news_cache::{NewsCache, NewsCacheDocument};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NewsSource {
    Cache,
    Provider,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialNews {
    pub items: Vec<NewsItem>,
    pub fetched_at: DateTime<Utc>,
    pub source: NewsSource,
}

/// Financial news behind a freshness window. The provider is only asked when
/// the cached copy is missing, stale, or the caller forces a refresh.
pub struct FinancialNewsService<C, K>
where
    C: AiProviderClient + ?Sized,
    K: KeyValueStore + ?Sized,
{
    ai_service: AiService<C>,
    cache: NewsCache<K>,
    max_age: Duration,
    now_provider: NowProvider,
}

impl<C, K> FinancialNewsService<C, K>
where
    C: AiProviderClient + ?Sized,
    K: KeyValueStore + ?Sized,
{
    pub fn new(client: Arc<C>, storage: Arc<K>, max_age: Duration) -> Self {
        Self {
            ai_service: AiService::new(client),
            cache: NewsCache::new(storage),
            max_age,
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.ai_service = self.ai_service.with_now_provider(Arc::clone(&now_provider));
        self.now_provider = now_provider;
        self
    }

    pub async fn get_news(
        &self,
        secret: &str,
        force_refresh: bool,
    ) -> Result<FinancialNews, InfraError> {
        let now = (self.now_provider)();
        if !force_refresh {
            if let Some(cached) = self.cache.load()? {
                if cached.is_fresh(now, self.max_age) {
                    return Ok(FinancialNews {
                        items: cached.items,
                        fetched_at: cached.fetched_at,
                        source: NewsSource::Cache,
                    });
                }
            }
        }

        let items = self.ai_service.get_financial_news(secret).await?;
        let document = NewsCacheDocument {
            fetched_at: now,
            items,
        };
        self.cache.store(&document)?;
        Ok(FinancialNews {
            items: document.items,
            fetched_at: document.fetched_at,
            source: NewsSource::Provider,
        })
    }
}
