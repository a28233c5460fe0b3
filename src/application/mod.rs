//! Application layer: turn orchestration, search execution, caching.

mod cache;
mod executor;
mod responder;
mod router;

pub use cache::ResultCache;
pub use executor::{ExecutorOutcome, SearchExecutor};
pub use responder::Responder;
pub use router::{ConversationService, TurnError};
