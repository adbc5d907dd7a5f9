//! Tanka diary — turns short health-chat messages into records, moods and poems.

pub mod analysis;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod nutrition;
pub mod pipeline;
pub mod store;
pub mod validation;
