// Resume analysis: reference parsing, the orchestrator state machine,
// the result store and the HTTP handlers on top of them.

pub mod handlers;
pub mod orchestrator;
pub mod reference;
pub mod result;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{Analyzer, Deadlines};
pub use store::{PgResultStore, ResultStore};
