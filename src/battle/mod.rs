pub mod action;
pub mod ai;
pub mod engine;
pub mod events;
pub mod input;
pub mod narration;
pub mod state;

#[cfg(test)]
pub(crate) mod tests;
