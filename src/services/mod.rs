//! Background services for WriteRight
//!
//! The grammar pipeline and its building blocks: request window, result
//! cache, LanguageTool backend and the offline rule table.

pub mod cache;
pub mod fallback;
pub mod grammar;
pub mod languagetool;
pub mod postprocess;
pub mod rate_limiter;

pub use cache::{CacheKey, ResultCache};
pub use fallback::FallbackMatcher;
pub use grammar::{GrammarBackend, GrammarClient};
pub use languagetool::LanguageToolBackend;
pub use rate_limiter::RateLimiter;
