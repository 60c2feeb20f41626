//! Property-based tests for the pulling parser.
