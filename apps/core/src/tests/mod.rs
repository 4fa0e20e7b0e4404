//! Test Module
//!
//! Cross-component test suite for the HeadDoWell core.
//!
//! ## Test Categories
//! - `triage_tests`: Behavioral properties of each pipeline stage over the bundled lexicon
//! - `integration_tests`: Full engine workflows, error surface and lexicon overrides

pub mod integration_tests;
