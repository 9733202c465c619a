//! Integration tests for Catalog-Harvest
//!
//! These tests use wiremock to serve the proxy and user-agent lists and a
//! page-serving transport to run the full harvest cycle end-to-end.

mod common;
mod harvest_tests;
mod identity_tests;
