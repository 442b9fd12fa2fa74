//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果の変換や操作者の解決など、
//! 複数のユースケースで繰り返されるパターンを共通化する。

use std::collections::HashMap;

use signflow_domain::{
    approval::{ApprovalDetail, ApprovalDocument},
    member::{Actor, Member, MemberId},
};
use signflow_infra::{
    InfraError,
    repository::{ApprovalDetailRepository, MemberRepository},
};

use crate::error::CoreError;

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, CoreError>` に変換する
///
/// ```ignore
/// let document = self.deps.document_repo.find_by_no(&approval_no).await
///     .or_not_found("決裁文書")?;
/// ```
pub(crate) trait FindResultExt<T> {
    /// `None` の場合は `CoreError::NotFound`、`InfraError` の場合は `CoreError::Internal` を返す
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(self, entity_name: &str) -> Result<T, CoreError> {
        self.map_err(|e| CoreError::Internal(format!("{}の取得に失敗: {}", entity_name, e)))?
            .ok_or_else(|| CoreError::NotFound(format!("{}が見つかりません", entity_name)))
    }
}

/// 操作者のメンバー情報を取得する
///
/// 呼び出し元（ゲートウェイ）が渡した ID がメンバーとして存在しない場合は `NotFound`。
pub(crate) async fn find_member(
    member_repo: &dyn MemberRepository,
    actor_id: &MemberId,
) -> Result<Member, CoreError> {
    member_repo.find_by_id(actor_id).await.or_not_found("メンバー")
}

/// 操作者を解決する
pub(crate) async fn resolve_actor(
    member_repo: &dyn MemberRepository,
    actor_id: &MemberId,
) -> Result<Actor, CoreError> {
    let member = find_member(member_repo, actor_id).await?;
    Ok(Actor::from(&member))
}

/// 決裁文書に本文を対応付ける
///
/// 本文が見つからない文書は一覧に出さない（警告ログのみ）。
/// 文書の並び順は保持する。
pub(crate) async fn attach_details(
    detail_repo: &dyn ApprovalDetailRepository,
    documents: Vec<ApprovalDocument>,
) -> Result<Vec<(ApprovalDocument, ApprovalDetail)>, CoreError> {
    let approval_nos: Vec<_> = documents.iter().map(|d| d.approval_no().clone()).collect();
    let mut details: HashMap<_, _> = detail_repo
        .find_by_nos(&approval_nos)
        .await
        .map_err(|e| CoreError::Internal(format!("本文の取得に失敗: {}", e)))?
        .into_iter()
        .map(|detail| (detail.approval_no().clone(), detail))
        .collect();

    Ok(documents
        .into_iter()
        .filter_map(|document| match details.remove(document.approval_no()) {
            Some(detail) => Some((document, detail)),
            None => {
                tracing::warn!(
                    approval_no = %document.approval_no(),
                    "本文が存在しない決裁文書を一覧から除外しました"
                );
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use signflow_infra::InfraError;

    use super::*;

    #[test]
    fn test_or_not_found_ok_some_は値を返す() {
        let result: Result<Option<i32>, InfraError> = Ok(Some(42));

        let value = result.or_not_found("テスト").unwrap();

        assert_eq!(value, 42);
    }

    #[test]
    fn test_or_not_found_ok_none_はnotfoundエラーを返す() {
        let result: Result<Option<i32>, InfraError> = Ok(None);

        let err = result.or_not_found("決裁文書").unwrap_err();

        match err {
            CoreError::NotFound(msg) => {
                assert_eq!(msg, "決裁文書が見つかりません");
            }
            other => panic!("NotFound を期待したが {:?} を受信", other),
        }
    }

    #[test]
    fn test_or_not_found_errはinternalエラーを返す() {
        let result: Result<Option<i32>, InfraError> = Err(InfraError::unexpected("接続失敗"));

        let err = result.or_not_found("決裁様式").unwrap_err();

        match err {
            CoreError::Internal(msg) => {
                assert!(msg.contains("決裁様式の取得に失敗"));
                assert!(msg.contains("接続失敗"));
            }
            other => panic!("Internal を期待したが {:?} を受信", other),
        }
    }
}
