//! # 文書に対する役割
//!
//! 操作者が文書に対してどの立場にあるかを 1 回の操作につき 1 度だけ判定する。
//!
//! 判定順は 決裁者 → 起案者 → 参照者 で、最初に一致したものを採用する。
//! 決裁者は既に決裁済みのスロットでも決裁者として扱う（決裁後のコメントを許可する）。

use super::ApprovalDocument;
use crate::member::Actor;

/// 文書に対する操作者の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// 起案者（ID で照合）
    Drafter,
    /// 決裁者（名前が最初に一致したスロットの位置）
    Signer(usize),
    /// 参照者（参照者リストのトークンと名前で照合）
    Referencer,
    /// 関係者ではない
    None,
}

impl Role {
    pub fn resolve(document: &ApprovalDocument, actor: &Actor) -> Self {
        if let Some(index) = document.signers().position_of(&actor.name) {
            return Self::Signer(index);
        }
        if document.is_drafted_by(&actor.id) {
            return Self::Drafter;
        }
        if document.references().contains(&actor.name) {
            return Self::Referencer;
        }
        Self::None
    }

    pub fn is_participant(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// 添付ファイルの情報ラベル
    pub fn attachment_info(&self, actor: &Actor) -> String {
        match self {
            Self::Drafter => "起案者コメント".to_string(),
            Self::Signer(_) => format!("{}（決裁者）", actor.name),
            Self::Referencer => format!("{}（参照者）", actor.name),
            Self::None => String::new(),
        }
    }
}
