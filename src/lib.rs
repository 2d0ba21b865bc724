//! faqbot: a FAQ-driven chat responder.
//!
//! Resolves a user message through an ordered pipeline: greeting check,
//! embedding-similarity match with a score threshold, exact and partial
//! lexical matching, LLM delegation with vagueness filtering, and finally a
//! canned fallback with the unanswered question logged for curation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use faqbot::chat::ChatService;
//! use faqbot::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = ChatService::new(&config)?;
//!
//!     let reply = service.respond("What are your opening hours?").await?;
//!     println!("[{:?}] {}", reply.source, reply.response);
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod fallback;
pub mod llm;
pub mod logging;
pub mod models;
pub mod store;

pub use chat::ChatService;
pub use config::AppConfig;
pub use errors::FaqBotError;
pub use errors::Result;
pub use models::ChatResponse;
pub use models::FaqInput;
pub use models::FaqRecord;
pub use models::ResponseSource;
