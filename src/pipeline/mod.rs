//! Health-chat message pipeline.
//!
//! Every message flows through:
//! 1. `Extractor::extract()` — measurements, food and exercise snippets
//! 2. `MoodScorer::analyze()` — tone and motivation, blended with history
//! 3. `PoemGenerator::generate()` — a 5-7-5-7-7 tanka from the day's events
//!
//! `HealthChatProcessor` runs the three in order against a store.

pub mod extractor;
pub mod mood;
pub mod mora;
pub mod processor;
pub mod tanka;
pub mod types;
