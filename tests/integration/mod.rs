//! Integration tests for the curriculum generation pipeline

mod cache;
mod linking;
mod pipeline;
mod rendering;
mod test_utils;
