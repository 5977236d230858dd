use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_PROFILE_AGE: u32 = 120;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub occupation: String,
}

impl UserProfile {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.name, "profile.name")?;
        validate_non_empty(&self.occupation, "profile.occupation")?;
        if self.age == 0 || self.age > MAX_PROFILE_AGE {
            return Err(format!("profile.age must be between 1 and {MAX_PROFILE_AGE}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "deepseek")]
    DeepSeek,
}

impl AiProvider {
    pub const ALL: [AiProvider; 3] = [AiProvider::Gemini, AiProvider::OpenAi, AiProvider::DeepSeek];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAi => "OpenAI",
            Self::DeepSeek => "DeepSeek",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for AiProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(format!("unsupported provider: {other}")),
        }
    }
}

/// The single active API secret. Stored in plain text alongside the rest of
/// the app state.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub provider: AiProvider,
    pub secret: String,
}

impl Credential {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.secret, "credential.secret")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Free-text label such as "9:00 AM" or "30 minutes"; never parsed.
    pub time_frame: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "todo.id")?;
        validate_non_empty(&self.title, "todo.title")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub todos: Vec<Todo>,
}

impl Routine {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "routine.id")?;
        for todo in &self.todos {
            todo.validate()?;
        }
        Ok(())
    }

    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|todo| todo.completed).count()
    }
}

/// A todo as the provider returns it, before ids and timestamps are assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub time_frame: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedRoutine {
    pub todos: Vec<GeneratedTodo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsFeed {
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    pub category: String,
    pub percentage: f64,
    pub amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentRecommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub percentage: f64,
    pub description: String,
    pub risk_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    pub goal: String,
    pub timeline: String,
    pub monthly_amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAdvice {
    pub budget_breakdown: Vec<BudgetCategory>,
    pub investment_recommendations: Vec<InvestmentRecommendation>,
    pub savings_goals: Vec<SavingsGoal>,
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdviceEnvelope {
    pub advice: FinancialAdvice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialAdviceRequest {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub expense_breakdown: Option<String>,
    pub financial_goals: Option<String>,
}

impl FinancialAdviceRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_amount(self.monthly_income, "advice.monthly_income")?;
        validate_amount(self.monthly_expenses, "advice.monthly_expenses")
    }
}

/// The signed-in user of the local session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl SessionUser {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.uid, "user.uid")
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

fn validate_amount(value: f64, field_name: &str) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{field_name} must be a non-negative number"));
    }
    Ok(())
}
