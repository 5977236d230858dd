pub mod ai_provider_client;
pub mod config;
pub mod error;
pub mod key_value_store;
pub mod news_cache;
pub mod response_extractor;
pub mod session_store;
pub mod state_store;
pub mod storage;
