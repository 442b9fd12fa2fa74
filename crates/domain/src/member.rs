//! # メンバー
//!
//! 起案者・決裁者・参照者として決裁に関わる社員。
//! メンバーの登録・更新は別システムの責務で、ここでは参照用の読み取りモデルのみを持つ。

use serde::{Deserialize, Serialize};

use crate::value_objects::MemberName;

define_validated_string! {
    /// メンバー ID（ログイン ID）
    ///
    /// 起案者の同一性判定はこの ID で行う。
    pub struct MemberId {
        label: "メンバー ID",
        max_length: 50,
    }
}

/// メンバー（読み取りモデル）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id:         MemberId,
    pub name:       MemberName,
    pub department: String,
    pub position:   String,
}

/// 操作者
///
/// 認証済みの呼び出し元を表す。すべての決裁操作はこの値を明示的に受け取る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id:   MemberId,
    pub name: MemberName,
}

impl From<&Member> for Actor {
    fn from(member: &Member) -> Self {
        Self {
            id:   member.id.clone(),
            name: member.name.clone(),
        }
    }
}
