pub mod ai_service;
pub mod bootstrap;
pub mod commands;
pub mod financial_news;
pub mod prompts;
