//! テストユーティリティ

mod approval_test_builder;

pub use approval_test_builder::{ApprovalTestBuilder, ApprovalTestSetup};
