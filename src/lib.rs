//! Currigen: Curriculum Document Generation Pipeline
//!
//! Generates structured teaching documents (schemes of work, concept
//! breakdowns, lesson plans, notes, assessment records) through an external
//! text-completion model, then recovers schema-stable records from the
//! model's unreliable pseudo-markdown table output.

pub mod api;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod linker;
pub mod logging;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod store;
pub mod table;
pub mod types;
pub mod visual;
