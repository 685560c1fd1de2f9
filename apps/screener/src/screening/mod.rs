//! Resume screening: document → prompt → model verdict → ranked comparison.

pub mod batch;
pub mod evaluator;
pub mod extract;
pub mod handlers;
pub mod parser;
pub mod preview;
pub mod prompts;
pub mod ranking;
pub mod registry;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
