//! End-to-end harvest tests against a mock Lodestone

mod harvest_tests;
