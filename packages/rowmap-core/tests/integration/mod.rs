//! Integration suite for the mapping contexts.
//!
//! 1. Descriptor registry
//! 2. SQL orchestration against a scripted driver
//! 3. In-memory reference engine

pub mod memory_context_tests;
pub mod registry_tests;
