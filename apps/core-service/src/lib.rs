//! # Core Service ライブラリ
//!
//! Core Service のユースケース・ハンドラ・ルーター構築を公開する。
//! テスト用に内部モジュールへのアクセスを提供する。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;

// テストユーティリティ（内部実装、ドキュメントからは隠す）
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;
