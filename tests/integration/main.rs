//! Integration tests for Catalog-Sweep
//!
//! These tests drive the scheduler and the coordinator against a scripted
//! in-memory catalog instead of a real browser.

mod crawl_tests;
mod fake;
mod sweep_tests;
