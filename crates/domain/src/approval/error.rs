//! 決裁ルール違反のエラー種別

use thiserror::Error;

/// 決裁ルール違反
///
/// すべて呼び出し元が回復可能な業務エラーで、利用者に理由を表示する前提のもの。
/// 自動リトライはしない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// 操作者が現在の決裁者ではない
    #[error("現在の決裁者ではありません")]
    NotCurrentSigner,

    /// 自分の未決裁スロットが見つからない（決裁済み、または並行更新に負けた）
    #[error("既に決裁済みか、決裁できない段階です")]
    AlreadyActedOrInvalidStage,

    /// 起案者本人ではない
    #[error("起案者のみが実行できる操作です")]
    NotDrafter,

    /// 現在の状態では実行できない
    #[error("現在の文書状態では実行できません")]
    InvalidStage,

    /// 既に決裁が始まっている
    #[error("既に決裁が進行しているため取り消せません")]
    AlreadyProgressed,

    /// コメント・添付の権限がない
    #[error("この文書にコメントする権限がありません")]
    NoCommentPermission,

    /// 決裁者として判定されたが該当スロットがない
    #[error("決裁者情報が一致しません")]
    SignerMismatch,

    /// 起案者の添付スロット（5 件）がすべて埋まっている
    #[error("添付ファイルは最大 5 件までです")]
    AttachmentSlotsFull,

    /// 決裁者の添付は文書ごとに 1 件まで
    #[error("決裁者の添付ファイルは既に登録されています")]
    SignerAttachmentExists,

    /// 参照者の添付は文書ごとに 1 件まで
    #[error("参照者の添付ファイルは既に登録されています")]
    ReferencerAttachmentExists,

    /// 文書の関係者ではない
    #[error("この文書を閲覧する権限がありません")]
    NotParticipant,

    /// 添付スロットが空、または存在しない
    #[error("指定された添付ファイルは存在しません")]
    InvalidAttachmentSlot,
}
