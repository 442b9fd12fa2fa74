//! # ページ番号付きレスポンス
//!
//! 0 始まりのページ番号によるページングに対応した API レスポンス型。

use serde::{Deserialize, Serialize};

/// ページ番号付きレスポンス
///
/// ## JSON 形式
///
/// ```json
/// {
///   "data": [...],
///   "page": 0,
///   "size": 15,
///   "total": 42
/// }
/// ```
///
/// `total` は絞り込み後の総件数で、ページング前の件数を表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub data:  Vec<T>,
    pub page:  usize,
    pub size:  usize,
    pub total: usize,
}

impl<T> PagedResponse<T> {
    /// 最終ページの番号（0 始まり）
    ///
    /// 0 件の場合も 0 を返す。
    pub fn last_page(&self) -> usize {
        if self.size == 0 || self.total == 0 {
            return 0;
        }
        (self.total - 1) / self.size
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn response(size: usize, total: usize) -> PagedResponse<u8> {
        PagedResponse {
            data: Vec::new(),
            page: 0,
            size,
            total,
        }
    }

    #[rstest]
    #[case::件数なし(15, 0, 0)]
    #[case::ちょうど1ページ(15, 15, 0)]
    #[case::端数あり(15, 16, 1)]
    #[case::サイズ0(0, 10, 0)]
    fn test_last_page(#[case] size: usize, #[case] total: usize, #[case] expected: usize) {
        assert_eq!(response(size, total).last_page(), expected);
    }

    #[test]
    fn test_jsonにページ情報がフラットに並ぶ() {
        let response = PagedResponse {
            data:  vec!["a"],
            page:  2,
            size:  15,
            total: 31,
        };

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "data": ["a"], "page": 2, "size": 15, "total": 31 })
        );
    }
}
