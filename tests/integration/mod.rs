//! Integration tests module
//!
//! These tests require a real Kubernetes cluster and are marked with #[ignore].
//! Run them with: cargo test --test integration -- --ignored
