//! Routine planner core: profile and credential onboarding, AI-generated daily
//! routines, and AI-generated financial news and advice, persisted as one local
//! state document.
//!
//! The functions at the crate root are the UI boundary. Each one runs the
//! matching `*_impl` command and turns its error into a short user-facing
//! message, logging the detail to `logs/commands.log`.

pub mod application;
pub mod domain;
pub mod infrastructure;

use application::bootstrap::bootstrap_workspace;
use application::commands::{
    clear_credential_impl, current_user_impl, delete_all_todos_impl, delete_routine_impl,
    generate_routine_impl, get_app_state_impl, get_financial_advice_impl,
    get_financial_news_impl, reset_all_data_impl, save_credential_impl, save_profile_impl,
    set_current_routine_impl, sign_in_impl, sign_out_impl, toggle_theme_impl,
    update_todo_status_impl, validate_and_save_credential_impl,
};
use serde::Serialize;
use std::path::PathBuf;

pub use application::commands::AppContext;
pub use application::financial_news::{FinancialNews, NewsSource};
pub use domain::app_state::AppState;
pub use domain::models::{
    AiProvider, FinancialAdvice, NewsItem, Routine, SessionUser, ThemeMode, Todo, UserProfile,
};
pub use infrastructure::error::InfraError;

#[derive(Debug, Serialize)]
pub struct BootstrapResponse {
    pub workspace_root: String,
    pub database_path: String,
}

pub fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
    let workspace_root = match root {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };

    let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
    Ok(BootstrapResponse {
        workspace_root: result.workspace_root.display().to_string(),
        database_path: result.database_path.display().to_string(),
    })
}

/// Opens the workspace in the current directory.
pub fn open() -> Result<AppContext, String> {
    let workspace_root = std::env::current_dir().map_err(|error| error.to_string())?;
    AppContext::new(workspace_root).map_err(|error| error.to_string())
}

pub fn get_app_state(context: &AppContext) -> Result<AppState, String> {
    get_app_state_impl(context).map_err(|error| context.command_error("get_app_state", &error))
}

pub fn save_profile(
    context: &AppContext,
    name: String,
    age: u32,
    occupation: String,
) -> Result<AppState, String> {
    save_profile_impl(context, name, age, occupation)
        .map_err(|error| context.command_error("save_profile", &error))
}

pub async fn validate_and_save_credential(
    context: &AppContext,
    provider: String,
    secret: String,
) -> Result<AppState, String> {
    validate_and_save_credential_impl(context, provider, secret)
        .await
        .map_err(|error| context.command_error("validate_and_save_credential", &error))
}

pub fn save_credential(
    context: &AppContext,
    provider: String,
    secret: String,
) -> Result<AppState, String> {
    save_credential_impl(context, provider, secret)
        .map_err(|error| context.command_error("save_credential", &error))
}

pub fn clear_credential(context: &AppContext) -> Result<AppState, String> {
    clear_credential_impl(context).map_err(|error| context.command_error("clear_credential", &error))
}

pub async fn generate_routine(
    context: &AppContext,
    description: String,
    date: Option<String>,
    routine_id: Option<String>,
) -> Result<Routine, String> {
    generate_routine_impl(context, description, date, routine_id)
        .await
        .map_err(|error| context.command_error("generate_routine", &error))
}

pub fn set_current_routine(context: &AppContext, routine_id: String) -> Result<AppState, String> {
    set_current_routine_impl(context, routine_id)
        .map_err(|error| context.command_error("set_current_routine", &error))
}

pub fn update_todo_status(
    context: &AppContext,
    routine_id: String,
    todo_id: String,
    completed: bool,
) -> Result<AppState, String> {
    update_todo_status_impl(context, routine_id, todo_id, completed)
        .map_err(|error| context.command_error("update_todo_status", &error))
}

pub fn delete_all_todos(context: &AppContext) -> Result<AppState, String> {
    delete_all_todos_impl(context).map_err(|error| context.command_error("delete_all_todos", &error))
}

pub fn delete_routine(context: &AppContext, routine_id: String) -> Result<bool, String> {
    delete_routine_impl(context, routine_id)
        .map_err(|error| context.command_error("delete_routine", &error))
}

pub fn toggle_theme(context: &AppContext) -> Result<ThemeMode, String> {
    toggle_theme_impl(context).map_err(|error| context.command_error("toggle_theme", &error))
}

pub async fn get_financial_news(
    context: &AppContext,
    force_refresh: bool,
) -> Result<FinancialNews, String> {
    get_financial_news_impl(context, force_refresh)
        .await
        .map_err(|error| context.command_error("get_financial_news", &error))
}

pub async fn get_financial_advice(
    context: &AppContext,
    monthly_income: Option<f64>,
    monthly_expenses: Option<f64>,
    expense_breakdown: Option<String>,
    financial_goals: Option<String>,
) -> Result<FinancialAdvice, String> {
    get_financial_advice_impl(
        context,
        monthly_income,
        monthly_expenses,
        expense_breakdown,
        financial_goals,
    )
    .await
    .map_err(|error| context.command_error("get_financial_advice", &error))
}

pub fn sign_in(
    context: &AppContext,
    email: String,
    display_name: Option<String>,
) -> Result<SessionUser, String> {
    sign_in_impl(context, email, display_name)
        .map_err(|error| context.command_error("sign_in", &error))
}

pub fn sign_out(context: &AppContext) -> Result<(), String> {
    sign_out_impl(context).map_err(|error| context.command_error("sign_out", &error))
}

pub fn current_user(context: &AppContext) -> Result<Option<SessionUser>, String> {
    current_user_impl(context).map_err(|error| context.command_error("current_user", &error))
}

pub fn reset_all_data(context: &AppContext) -> Result<AppState, String> {
    reset_all_data_impl(context).map_err(|error| context.command_error("reset_all_data", &error))
}
