//! Chat resolution: snapshot cache, greeting and lexical matchers, and the
//! ordered pipeline tying every stage together.

pub mod cache;
pub mod greeting;
pub mod matcher;
pub mod pipeline;

pub use cache::FaqCache;
pub use greeting::Greeter;
pub use pipeline::ChatService;
