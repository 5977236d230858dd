use crate::application::ai_service::{next_id, AiService, NowProvider, RoutineRequest};
use crate::application::bootstrap::bootstrap_workspace;
use crate::application::financial_news::{FinancialNews, FinancialNewsService};
use crate::domain::app_state::AppState;
use crate::domain::models::{
    AiProvider, Credential, FinancialAdvice, FinancialAdviceRequest, Routine, SessionUser,
    ThemeMode, UserProfile,
};
use crate::infrastructure::ai_provider_client::{client_for, AiProviderClient};
use crate::infrastructure::config::{
    read_default_provider, read_news_cache_hours, read_provider_endpoints,
};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::key_value_store::SqliteKeyValueStore;
use crate::infrastructure::news_cache::NewsCache;
use crate::infrastructure::session_store::SessionStore;
use crate::infrastructure::state_store::StateStore;
use chrono::{Duration, NaiveDate, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle passed to every command. Holds the workspace paths, the persisted
/// store and an in-memory mirror of the last committed `AppState`.
pub struct AppContext {
    config_dir: PathBuf,
    database_path: PathBuf,
    logs_dir: PathBuf,
    storage: Arc<SqliteKeyValueStore>,
    state_store: StateStore<SqliteKeyValueStore>,
    runtime: Mutex<AppState>,
    log_guard: Mutex<()>,
    now_provider: NowProvider,
}

impl AppContext {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let storage = Arc::new(SqliteKeyValueStore::new(&bootstrap.database_path));

        let context = Self {
            config_dir: bootstrap.config_dir,
            database_path: bootstrap.database_path,
            logs_dir: bootstrap.logs_dir,
            state_store: StateStore::new(Arc::clone(&storage)),
            storage,
            runtime: Mutex::new(AppState::default()),
            log_guard: Mutex::new(()),
            now_provider: Arc::new(Utc::now),
        };

        let loaded = match context.state_store.read() {
            Ok(state) => state.unwrap_or_default(),
            Err(InfraError::StorageCorrupt(detail)) => {
                context.log_error("load_state", &format!("stored state reset to defaults: {detail}"));
                AppState::default()
            }
            Err(error) => return Err(error),
        };
        *lock_runtime(&context)? = loaded;
        Ok(context)
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Logs the full error and returns the short message meant for the user.
    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.user_message()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    fn provider_client(&self, provider: AiProvider) -> Result<Arc<dyn AiProviderClient>, InfraError> {
        let endpoints = read_provider_endpoints(&self.config_dir)?;
        Ok(client_for(provider, &endpoints))
    }

    fn today(&self) -> NaiveDate {
        (self.now_provider)().date_naive()
    }
}

fn lock_runtime(context: &AppContext) -> Result<MutexGuard<'_, AppState>, InfraError> {
    context
        .runtime
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("runtime lock poisoned: {error}")))
}

/// Mirrors a freshly persisted state into memory.
fn commit(context: &AppContext, state: AppState) -> Result<AppState, InfraError> {
    *lock_runtime(context)? = state.clone();
    Ok(state)
}

fn snapshot(context: &AppContext) -> Result<AppState, InfraError> {
    Ok(lock_runtime(context)?.clone())
}

/// A blank provider falls back to `defaultProvider` from `config/app.json`.
fn parse_provider(context: &AppContext, raw: &str) -> Result<AiProvider, InfraError> {
    if raw.trim().is_empty() {
        return read_default_provider(&context.config_dir);
    }
    raw.parse::<AiProvider>().map_err(InfraError::InvalidInput)
}

fn require_profile(state: &AppState) -> Result<UserProfile, InfraError> {
    state.profile.clone().ok_or_else(|| {
        InfraError::InvalidInput("Please complete your profile first.".to_string())
    })
}

fn require_credential(state: &AppState) -> Result<Credential, InfraError> {
    state.credential.clone().ok_or_else(|| {
        InfraError::InvalidInput("API key is missing. Please add your API key first.".to_string())
    })
}

fn parse_date(raw: Option<String>, fallback: NaiveDate) -> Result<NaiveDate, InfraError> {
    let Some(raw) = raw.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
    else {
        return Ok(fallback);
    };
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|error| InfraError::InvalidInput(format!("invalid date '{raw}': {error}")))
}

pub fn get_app_state_impl(context: &AppContext) -> Result<AppState, InfraError> {
    snapshot(context)
}

pub fn save_profile_impl(
    context: &AppContext,
    name: String,
    age: u32,
    occupation: String,
) -> Result<AppState, InfraError> {
    let profile = UserProfile {
        name: name.trim().to_string(),
        age,
        occupation: occupation.trim().to_string(),
    };
    profile.validate().map_err(InfraError::InvalidInput)?;

    let state = context.state_store.save_profile(&profile)?;
    context.log_info("save_profile", "saved user profile");
    commit(context, state)
}

pub fn save_credential_impl(
    context: &AppContext,
    provider: String,
    secret: String,
) -> Result<AppState, InfraError> {
    let credential = Credential {
        provider: parse_provider(context, &provider)?,
        secret: secret.trim().to_string(),
    };
    credential.validate().map_err(InfraError::InvalidInput)?;

    let state = context.state_store.save_credential(&credential)?;
    context.log_info(
        "save_credential",
        &format!("saved credential provider={}", credential.provider.as_str()),
    );
    commit(context, state)
}

/// Checks the key with the provider first; nothing is stored when the
/// provider rejects it or cannot be reached.
pub async fn validate_and_save_credential_impl(
    context: &AppContext,
    provider: String,
    secret: String,
) -> Result<AppState, InfraError> {
    let provider = parse_provider(context, &provider)?;
    let secret = secret.trim().to_string();
    if secret.is_empty() {
        return Err(InfraError::InvalidInput("Please enter an API key.".to_string()));
    }

    let service = AiService::new(context.provider_client(provider)?);
    if !service.validate_credential(&secret).await? {
        return Err(InfraError::CredentialInvalid {
            provider: provider.display_name().to_string(),
        });
    }
    context.log_info(
        "validate_and_save_credential",
        &format!("provider={} accepted the credential", provider.as_str()),
    );
    save_credential_impl(context, provider.as_str().to_string(), secret)
}

pub fn clear_credential_impl(context: &AppContext) -> Result<AppState, InfraError> {
    let state = context.state_store.clear_credential()?;
    context.log_info("clear_credential", "cleared credential");
    commit(context, state)
}

/// Generates a routine for `date` (today when absent). Passing the id of an
/// existing routine regenerates it in place.
pub async fn generate_routine_impl(
    context: &AppContext,
    description: String,
    date: Option<String>,
    routine_id: Option<String>,
) -> Result<Routine, InfraError> {
    if description.trim().is_empty() {
        return Err(InfraError::InvalidInput(
            "Please describe your daily routine.".to_string(),
        ));
    }
    let date = parse_date(date, context.today())?;
    let current = snapshot(context)?;
    let profile = require_profile(&current)?;
    let credential = require_credential(&current)?;

    let service = AiService::new(context.provider_client(credential.provider)?)
        .with_now_provider(Arc::clone(&context.now_provider));
    let request = RoutineRequest {
        description,
        date,
        routine_id,
    };
    let routine = service
        .generate_routine(&credential.secret, &profile, &request)
        .await?;

    let state = context.state_store.save_routine(&routine)?;
    commit(context, state)?;
    context.log_info(
        "generate_routine",
        &format!(
            "generated routine_id={} todos={} provider={}",
            routine.id,
            routine.todos.len(),
            credential.provider.as_str()
        ),
    );
    Ok(routine)
}

pub fn set_current_routine_impl(
    context: &AppContext,
    routine_id: String,
) -> Result<AppState, InfraError> {
    let (state, found) = context.state_store.set_current_routine(routine_id.trim())?;
    if !found {
        return Err(InfraError::InvalidInput(format!(
            "routine not found: {routine_id}"
        )));
    }
    context.log_info(
        "set_current_routine",
        &format!("current routine_id={routine_id}"),
    );
    commit(context, state)
}

/// A miss on either id leaves the state as it was.
pub fn update_todo_status_impl(
    context: &AppContext,
    routine_id: String,
    todo_id: String,
    completed: bool,
) -> Result<AppState, InfraError> {
    let (state, updated) = context
        .state_store
        .update_todo(&routine_id, &todo_id, completed)?;
    let message = if updated {
        format!("routine_id={routine_id} todo_id={todo_id} completed={completed}")
    } else {
        format!("no todo matched routine_id={routine_id} todo_id={todo_id}")
    };
    context.log_info("update_todo_status", &message);
    commit(context, state)
}

/// Removes the current routine with all of its todos; other routines stay.
pub fn delete_all_todos_impl(context: &AppContext) -> Result<AppState, InfraError> {
    let (state, removed) = context.state_store.update(AppState::delete_current_routine)?;
    let message = match removed {
        Some(routine) => format!("deleted routine_id={}", routine.id),
        None => "no current routine".to_string(),
    };
    context.log_info("delete_all_todos", &message);
    commit(context, state)
}

pub fn delete_routine_impl(context: &AppContext, routine_id: String) -> Result<bool, InfraError> {
    let (state, removed) = context.state_store.delete_routine(&routine_id)?;
    commit(context, state)?;
    if removed.is_some() {
        context.log_info("delete_routine", &format!("deleted routine_id={routine_id}"));
    }
    Ok(removed.is_some())
}

pub fn toggle_theme_impl(context: &AppContext) -> Result<ThemeMode, InfraError> {
    let (state, theme_mode) = context.state_store.update(AppState::toggle_theme)?;
    commit(context, state)?;
    Ok(theme_mode)
}

pub async fn get_financial_news_impl(
    context: &AppContext,
    force_refresh: bool,
) -> Result<FinancialNews, InfraError> {
    let credential = require_credential(&snapshot(context)?)?;
    let hours = read_news_cache_hours(&context.config_dir)?;
    let max_age = Duration::try_hours(hours).ok_or_else(|| {
        InfraError::InvalidConfig(format!("newsCacheHours out of range: {hours}"))
    })?;
    let service = FinancialNewsService::new(
        context.provider_client(credential.provider)?,
        Arc::clone(&context.storage),
        max_age,
    )
    .with_now_provider(Arc::clone(&context.now_provider));

    let news = service.get_news(&credential.secret, force_refresh).await?;
    context.log_info(
        "get_financial_news",
        &format!("items={} source={:?}", news.items.len(), news.source),
    );
    Ok(news)
}

pub async fn get_financial_advice_impl(
    context: &AppContext,
    monthly_income: Option<f64>,
    monthly_expenses: Option<f64>,
    expense_breakdown: Option<String>,
    financial_goals: Option<String>,
) -> Result<FinancialAdvice, InfraError> {
    let (Some(monthly_income), Some(monthly_expenses)) = (monthly_income, monthly_expenses) else {
        return Err(InfraError::InvalidInput(
            "Please provide both monthly income and expenses.".to_string(),
        ));
    };
    let request = FinancialAdviceRequest {
        monthly_income,
        monthly_expenses,
        expense_breakdown,
        financial_goals,
    };
    request.validate().map_err(InfraError::InvalidInput)?;
    let current = snapshot(context)?;
    let profile = require_profile(&current)?;
    let credential = require_credential(&current)?;

    let service = AiService::new(context.provider_client(credential.provider)?);
    let advice = service
        .get_financial_advice(&credential.secret, &profile, &request)
        .await?;
    context.log_info(
        "get_financial_advice",
        &format!(
            "budget_categories={} tips={}",
            advice.budget_breakdown.len(),
            advice.tips.len()
        ),
    );
    Ok(advice)
}

/// Local sign-in: remembers the user without contacting an identity provider.
pub fn sign_in_impl(
    context: &AppContext,
    email: String,
    display_name: Option<String>,
) -> Result<SessionUser, InfraError> {
    let email = email.trim().to_string();
    if email.is_empty() {
        return Err(InfraError::InvalidInput("email must not be empty".to_string()));
    }
    let user = SessionUser {
        uid: next_id("user"),
        email: Some(email),
        display_name: display_name
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
        photo_url: None,
    };
    SessionStore::new(Arc::clone(&context.storage)).sign_in(&user)?;
    context.log_info("sign_in", &format!("signed in uid={}", user.uid));
    Ok(user)
}

pub fn sign_out_impl(context: &AppContext) -> Result<(), InfraError> {
    SessionStore::new(Arc::clone(&context.storage)).sign_out()?;
    context.log_info("sign_out", "signed out");
    Ok(())
}

pub fn current_user_impl(context: &AppContext) -> Result<Option<SessionUser>, InfraError> {
    SessionStore::new(Arc::clone(&context.storage)).current_user()
}

/// Forgets everything: app state, cached news and the signed-in user.
pub fn reset_all_data_impl(context: &AppContext) -> Result<AppState, InfraError> {
    context.state_store.clear()?;
    NewsCache::new(Arc::clone(&context.storage)).clear()?;
    SessionStore::new(Arc::clone(&context.storage)).sign_out()?;
    context.log_info("reset_all_data", "cleared all stored data");
    commit(context, AppState::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::save_provider_base_url;
    use crate::infrastructure::error::GenerationError;
    use crate::infrastructure::key_value_store::KeyValueStore;
    use crate::infrastructure::state_store::APP_STATE_KEY;
    use serde_json::json;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    static NEXT_TEMP_WORKSPACE: AtomicUsize = AtomicUsize::new(0);

    const GEMINI_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";
    const STANDUP_TODOS: &str =
        r#"{"todos":[{"title":"Standup","description":"Sync with team","timeFrame":"9:00 AM"}]}"#;

    struct TempWorkspace {
        path: PathBuf,
    }

    impl TempWorkspace {
        fn new() -> Self {
            let sequence = NEXT_TEMP_WORKSPACE.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "routine-planner-command-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp workspace");
            Self { path }
        }

        fn context(&self) -> AppContext {
            AppContext::new(self.path.clone()).expect("initialize app context")
        }

        fn point_gemini_at(&self, server: &MockServer) {
            let context = self.context();
            save_provider_base_url(
                context.config_dir(),
                AiProvider::Gemini,
                &format!("{}/v1beta", server.uri()),
            )
            .expect("override gemini base url");
        }

        fn log_contents(&self) -> String {
            fs::read_to_string(self.path.join("logs").join("commands.log")).unwrap_or_default()
        }
    }

    impl Drop for TempWorkspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn gemini_reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
    }

    fn onboard(context: &AppContext) {
        save_profile_impl(context, "Ana".to_string(), 30, "Engineer".to_string())
            .expect("save profile");
        save_credential_impl(context, "gemini".to_string(), "g-secret-key".to_string())
            .expect("save credential");
    }

    #[test]
    fn fresh_workspace_starts_with_default_state() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();
        assert_eq!(get_app_state_impl(&context).expect("state"), AppState::default());
        assert!(context.database_path().exists());
    }

    #[test]
    fn save_profile_validates_and_persists() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();

        let result = save_profile_impl(&context, "Ana".to_string(), 0, "Engineer".to_string());
        assert!(matches!(result, Err(InfraError::InvalidInput(_))));

        let state = save_profile_impl(&context, " Ana ".to_string(), 30, "Engineer".to_string())
            .expect("save profile");
        assert!(state.is_onboarded);
        assert_eq!(state.profile.as_ref().map(|p| p.name.as_str()), Some("Ana"));

        let reopened = workspace.context();
        assert_eq!(get_app_state_impl(&reopened).expect("state"), state);
    }

    #[test]
    fn unknown_provider_is_invalid_input() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();
        let result = save_credential_impl(&context, "claude".to_string(), "key".to_string());
        assert!(matches!(result, Err(InfraError::InvalidInput(_))));
    }

    #[test]
    fn blank_provider_uses_configured_default() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();
        let state = save_credential_impl(&context, " ".to_string(), "key".to_string())
            .expect("save credential");
        assert_eq!(state.credential.map(|c| c.provider), Some(AiProvider::Gemini));
    }

    #[tokio::test]
    async fn generate_routine_checks_preconditions_in_order() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();

        let blank = generate_routine_impl(&context, "  ".to_string(), None, None).await;
        assert!(matches!(blank, Err(InfraError::InvalidInput(ref m)) if m.contains("describe")));

        let no_profile = generate_routine_impl(&context, "Deep work day".to_string(), None, None).await;
        assert!(matches!(no_profile, Err(InfraError::InvalidInput(ref m)) if m.contains("profile")));

        save_profile_impl(&context, "Ana".to_string(), 30, "Engineer".to_string())
            .expect("save profile");
        let no_key = generate_routine_impl(&context, "Deep work day".to_string(), None, None).await;
        assert!(matches!(no_key, Err(InfraError::InvalidInput(ref m)) if m.contains("API key")));

        let bad_date = generate_routine_impl(
            &context,
            "Deep work day".to_string(),
            Some("01/05/2024".to_string()),
            None,
        )
        .await;
        assert!(matches!(bad_date, Err(InfraError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn generate_routine_end_to_end_makes_it_current() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .and(query_param("key", "g-secret-key"))
            .respond_with(gemini_reply(&format!("Here is the plan:\n{STANDUP_TODOS}")))
            .expect(1)
            .mount(&server)
            .await;

        let workspace = TempWorkspace::new();
        workspace.point_gemini_at(&server);
        let context = workspace.context();
        onboard(&context);

        let routine = generate_routine_impl(
            &context,
            "Deep work day".to_string(),
            Some("2024-05-01".to_string()),
            None,
        )
        .await
        .expect("generate routine");

        assert_eq!(routine.todos.len(), 1);
        assert_eq!(routine.todos[0].title, "Standup");
        assert!(!routine.todos[0].completed);

        let state = get_app_state_impl(&context).expect("state");
        assert_eq!(state.current_routine(), Some(&routine));
        let reopened = workspace.context();
        assert_eq!(get_app_state_impl(&reopened).expect("state"), state);

        let log = workspace.log_contents();
        assert!(log.contains("\"command\":\"generate_routine\""));
        assert!(!log.contains("g-secret-key"));
    }

    #[tokio::test]
    async fn regenerating_with_same_id_replaces_in_place() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(gemini_reply(STANDUP_TODOS))
            .mount(&server)
            .await;

        let workspace = TempWorkspace::new();
        workspace.point_gemini_at(&server);
        let context = workspace.context();
        onboard(&context);

        let first = generate_routine_impl(&context, "Deep work day".to_string(), None, None)
            .await
            .expect("first routine");
        let second = generate_routine_impl(&context, "Gym day".to_string(), None, None)
            .await
            .expect("second routine");
        let regenerated = generate_routine_impl(
            &context,
            "Deep work day, take two".to_string(),
            None,
            Some(first.id.clone()),
        )
        .await
        .expect("regenerated routine");

        let state = get_app_state_impl(&context).expect("state");
        assert_eq!(state.routines.len(), 2);
        assert_eq!(state.routines[0].id, first.id);
        assert_eq!(state.routines[0].description, "Deep work day, take two");
        assert_eq!(state.routines[1].id, second.id);
        assert_eq!(state.current_routine_id, Some(regenerated.id));
    }

    #[tokio::test]
    async fn unusable_reply_surfaces_retry_message_and_keeps_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(gemini_reply("I'd rather not."))
            .mount(&server)
            .await;

        let workspace = TempWorkspace::new();
        workspace.point_gemini_at(&server);
        let context = workspace.context();
        onboard(&context);
        let before = get_app_state_impl(&context).expect("state");

        let error = generate_routine_impl(&context, "Deep work day".to_string(), None, None)
            .await
            .expect_err("no json in reply");
        let message = context.command_error("generate_routine", &error);

        assert_eq!(message, "Received invalid response from AI service. Please try again.");
        assert_eq!(get_app_state_impl(&context).expect("state"), before);
        assert!(workspace.log_contents().contains("\"level\":\"error\""));
    }

    #[tokio::test]
    async fn unreachable_gemini_keeps_key_out_of_log() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();
        save_provider_base_url(
            context.config_dir(),
            AiProvider::Gemini,
            "http://127.0.0.1:1/v1beta",
        )
        .expect("override gemini base url");
        save_profile_impl(&context, "Ana".to_string(), 30, "Engineer".to_string())
            .expect("save profile");
        save_credential_impl(&context, "gemini".to_string(), "SUPER-SECRET-KEY".to_string())
            .expect("save credential");

        let error = generate_routine_impl(&context, "Deep work day".to_string(), None, None)
            .await
            .expect_err("connection refused");
        assert!(matches!(
            error,
            InfraError::Generation(GenerationError::Network(_))
        ));
        let message = context.command_error("generate_routine", &error);

        assert!(!message.contains("SUPER-SECRET-KEY"));
        let log = workspace.log_contents();
        assert!(log.contains("\"command\":\"generate_routine\""));
        assert!(!log.contains("SUPER-SECRET-KEY"));
    }

    #[tokio::test]
    async fn rejected_key_is_not_saved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .and(query_param("key", "bad-key"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .and(query_param("key", "good-key"))
            .respond_with(gemini_reply("hello"))
            .mount(&server)
            .await;

        let workspace = TempWorkspace::new();
        workspace.point_gemini_at(&server);
        let context = workspace.context();

        let error = validate_and_save_credential_impl(&context, "gemini".to_string(), "bad-key".to_string())
            .await
            .expect_err("403 rejects the key");
        assert!(matches!(error, InfraError::CredentialInvalid { .. }));
        assert_eq!(
            error.user_message(),
            "Invalid Gemini API key. Please check and try again."
        );
        assert!(get_app_state_impl(&context).expect("state").credential.is_none());

        let state = validate_and_save_credential_impl(&context, "Gemini".to_string(), "good-key".to_string())
            .await
            .expect("valid key saved");
        assert_eq!(state.credential.map(|c| c.provider), Some(AiProvider::Gemini));

        let cleared = clear_credential_impl(&context).expect("clear credential");
        assert!(cleared.credential.is_none());
    }

    #[test]
    fn todo_updates_and_misses() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();
        let routine = sample_routine("routine-a");
        let state = context.state_store.save_routine(&routine).expect("seed routine");
        commit(&context, state).expect("commit seed");

        let state = update_todo_status_impl(
            &context,
            "routine-a".to_string(),
            "routine-a-todo".to_string(),
            true,
        )
        .expect("update todo");
        assert_eq!(state.routines[0].completed_count(), 1);

        let unchanged = update_todo_status_impl(
            &context,
            "routine-a".to_string(),
            "missing".to_string(),
            false,
        )
        .expect("miss is not an error");
        assert_eq!(unchanged, state);
    }

    #[test]
    fn delete_all_todos_removes_only_the_current_routine() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();
        context.state_store.save_routine(&sample_routine("routine-a")).expect("seed a");
        let state = context
            .state_store
            .save_routine(&sample_routine("routine-b"))
            .expect("seed b");
        commit(&context, state).expect("commit seed");
        set_current_routine_impl(&context, "routine-a".to_string()).expect("set current");

        let state = delete_all_todos_impl(&context).expect("delete all todos");
        assert!(state.current_routine_id.is_none());
        assert_eq!(state.routines, vec![sample_routine("routine-b")]);

        assert!(set_current_routine_impl(&context, "routine-a".to_string()).is_err());
        assert!(delete_routine_impl(&context, "routine-b".to_string()).expect("delete b"));
        assert!(!delete_routine_impl(&context, "routine-b".to_string()).expect("delete again"));
        assert!(get_app_state_impl(&context).expect("state").routines.is_empty());
    }

    #[test]
    fn toggle_theme_persists() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();
        assert_eq!(toggle_theme_impl(&context).expect("toggle"), ThemeMode::Dark);

        let reopened = workspace.context();
        assert_eq!(
            get_app_state_impl(&reopened).expect("state").theme_mode,
            ThemeMode::Dark
        );
        assert_eq!(toggle_theme_impl(&reopened).expect("toggle"), ThemeMode::Light);
    }

    #[tokio::test]
    async fn financial_news_is_served_from_cache_within_window() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(gemini_reply(
                r#"{"news":[{"id":"1","title":"Rates hold","summary":"Central bank pauses.","source":"Wire","publishedAt":"2024-05-01"}]}"#,
            ))
            .expect(2)
            .mount(&server)
            .await;

        let workspace = TempWorkspace::new();
        workspace.point_gemini_at(&server);
        let context = workspace.context();
        onboard(&context);

        let first = get_financial_news_impl(&context, false).await.expect("first news");
        let cached = get_financial_news_impl(&context, false).await.expect("cached news");
        assert_eq!(cached.items, first.items);
        assert_eq!(cached.fetched_at, first.fetched_at);

        get_financial_news_impl(&context, true).await.expect("forced news");
    }

    #[tokio::test]
    async fn financial_advice_requires_both_amounts() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();
        onboard(&context);

        let result = get_financial_advice_impl(&context, Some(5000.0), None, None, None).await;
        assert!(matches!(result, Err(InfraError::InvalidInput(ref m)) if m.contains("both")));

        let result = get_financial_advice_impl(&context, Some(5000.0), Some(-10.0), None, None).await;
        assert!(matches!(result, Err(InfraError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn financial_advice_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GEMINI_PATH))
            .respond_with(gemini_reply(
                r#"{"advice":{"budgetBreakdown":[{"category":"Housing","percentage":30,"amount":1500,"description":"Rent"}],"investmentRecommendations":[],"savingsGoals":[],"tips":["Automate savings"]}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let workspace = TempWorkspace::new();
        workspace.point_gemini_at(&server);
        let context = workspace.context();
        onboard(&context);

        let advice = get_financial_advice_impl(
            &context,
            Some(5000.0),
            Some(3200.0),
            Some("Rent 1500".to_string()),
            None,
        )
        .await
        .expect("advice");
        assert_eq!(advice.budget_breakdown[0].category, "Housing");
        assert_eq!(advice.tips, vec!["Automate savings".to_string()]);
    }

    #[test]
    fn sign_in_and_out() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();
        assert_eq!(current_user_impl(&context).expect("no user"), None);

        let user = sign_in_impl(&context, "ana@example.com".to_string(), Some("Ana".to_string()))
            .expect("sign in");
        assert_eq!(current_user_impl(&context).expect("user"), Some(user));

        sign_out_impl(&context).expect("sign out");
        assert_eq!(current_user_impl(&context).expect("signed out"), None);
    }

    #[test]
    fn corrupt_stored_state_is_reset_and_logged() {
        let workspace = TempWorkspace::new();
        let database_path = workspace.context().database_path().to_path_buf();
        SqliteKeyValueStore::new(&database_path)
            .set_item(APP_STATE_KEY, "{not json")
            .expect("write corrupt state");

        let context = workspace.context();
        assert_eq!(get_app_state_impl(&context).expect("state"), AppState::default());
        assert!(workspace.log_contents().contains("\"command\":\"load_state\""));

        let state = toggle_theme_impl(&context).map(|_| get_app_state_impl(&context));
        assert_eq!(state.expect("toggle").expect("state").theme_mode, ThemeMode::Dark);
    }

    #[test]
    fn reset_all_data_forgets_everything() {
        let workspace = TempWorkspace::new();
        let context = workspace.context();
        onboard(&context);
        sign_in_impl(&context, "ana@example.com".to_string(), None).expect("sign in");

        let state = reset_all_data_impl(&context).expect("reset");
        assert_eq!(state, AppState::default());
        assert_eq!(current_user_impl(&context).expect("user"), None);
        assert_eq!(
            get_app_state_impl(&workspace.context()).expect("state"),
            AppState::default()
        );
    }

    fn sample_routine(id: &str) -> Routine {
        use crate::domain::models::Todo;
        Routine {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
            description: "Deep work day".to_string(),
            todos: vec![Todo {
                id: format!("{id}-todo"),
                title: "Standup".to_string(),
                description: "Sync with team".to_string(),
                time_frame: "9:00 AM".to_string(),
                completed: false,
                created_at: chrono::DateTime::parse_from_rfc3339("2024-05-01T07:00:00Z")
                    .expect("valid datetime")
                    .with_timezone(&Utc),
            }],
        }
    }
}
