use crate::application::prompts::{advice_prompt, news_prompt, routine_prompt};
use crate::domain::models::{
    AdviceEnvelope, AiProvider, FinancialAdvice, FinancialAdviceRequest, GeneratedRoutine,
    NewsFeed, NewsItem, Routine, Todo, UserProfile,
};
use crate::infrastructure::ai_provider_client::AiProviderClient;
use crate::infrastructure::error::{ExtractionError, InfraError};
use crate::infrastructure::response_extractor::{extract, ExpectedShape};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub(crate) type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

#[derive(Debug, Clone)]
pub struct RoutineRequest {
    pub description: String,
    pub date: NaiveDate,
    /// Set when regenerating: the result keeps this id so it replaces the
    /// stored routine instead of being added next to it.
    pub routine_id: Option<String>,
}

/// The four typed AI operations. One prompt, one provider call, one extraction
/// per operation; nothing is retried.
pub struct AiService<C>
where
    C: AiProviderClient + ?Sized,
{
    client: Arc<C>,
    now_provider: NowProvider,
}

impl<C> AiService<C>
where
    C: AiProviderClient + ?Sized,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn provider(&self) -> AiProvider {
        self.client.provider()
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.now_provider)()
    }

    pub async fn validate_credential(&self, secret: &str) -> Result<bool, InfraError> {
        self.client.validate_credential(secret).await
    }

    pub async fn generate_routine(
        &self,
        secret: &str,
        profile: &UserProfile,
        request: &RoutineRequest,
    ) -> Result<Routine, InfraError> {
        if request.description.trim().is_empty() {
            return Err(InfraError::InvalidInput(
                "Please describe your daily routine.".to_string(),
            ));
        }
        profile.validate().map_err(InfraError::InvalidInput)?;

        let prompt = routine_prompt(profile, &request.description, request.date);
        let raw_text = self.client.generate(secret, &prompt).await?;
        let generated: GeneratedRoutine = extract(&raw_text, ExpectedShape::Todos)?;

        let created_at = self.now();
        let todos = generated
            .todos
            .into_iter()
            .map(|todo| Todo {
                id: next_id("todo"),
                title: todo.title.trim().to_string(),
                description: todo.description.trim().to_string(),
                time_frame: todo.time_frame.trim().to_string(),
                completed: false,
                created_at,
            })
            .collect();

        let routine = Routine {
            id: request
                .routine_id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| next_id("routine")),
            date: request.date,
            description: request.description.trim().to_string(),
            todos,
        };
        routine
            .validate()
            .map_err(|error| InfraError::Extraction(ExtractionError::SchemaMismatch(error)))?;
        Ok(routine)
    }

    pub async fn get_financial_news(&self, secret: &str) -> Result<Vec<NewsItem>, InfraError> {
        let prompt = news_prompt(self.now().date_naive());
        let raw_text = self.client.generate(secret, &prompt).await?;
        let feed: NewsFeed = extract(&raw_text, ExpectedShape::News)?;
        Ok(feed
            .news
            .into_iter()
            .enumerate()
            .map(|(index, mut item)| {
                if item.id.trim().is_empty() {
                    item.id = (index + 1).to_string();
                }
                item
            })
            .collect())
    }

    pub async fn get_financial_advice(
        &self,
        secret: &str,
        profile: &UserProfile,
        request: &FinancialAdviceRequest,
    ) -> Result<FinancialAdvice, InfraError> {
        profile.validate().map_err(InfraError::InvalidInput)?;
        request.validate().map_err(InfraError::InvalidInput)?;

        let prompt = advice_prompt(profile, request);
        let raw_text = self.client.generate(secret, &prompt).await?;
        let envelope: AdviceEnvelope = extract(&raw_text, ExpectedShape::Advice)?;
        Ok(envelope.advice)
    }
}
