pub mod conversation;
pub mod filter;
pub mod gateway;
pub mod llm;
pub mod parser;
pub mod prompt;
pub mod query;
pub mod render;
pub mod settings;
pub mod store;
pub mod trigger;
pub mod vehicle;
pub mod vocabulary;
pub mod web;
