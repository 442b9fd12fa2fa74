//! # コメントと添付
//!
//! 起案者・決裁者・参照者がそれぞれ自分の欄に書き込むコメントと、コメントに添える添付ファイル。
//!
//! | 役割 | コメント欄 | 添付 |
//! |------|-----------|------|
//! | 決裁者 | 自分のスロットの決裁者コメント | 決裁者スロット（文書ごとに 1 件） |
//! | 起案者 | 起案者コメント | 起案者スロットの最初の空き |
//! | 参照者 | 参照者コメント | 参照者スロット（文書ごとに 1 件） |
//!
//! 添付の可否はファイルを保存する前に [`authorize_comment`] で確認し、
//! 書き込み後に業務エラーで失敗しないようにする。

use chrono::{DateTime, Utc};

use super::{ApprovalDetail, ApprovalDocument, ApprovalError, Attachment, Role};
use crate::member::Actor;

/// コメント操作の結果
///
/// `role` が `Signer` のときだけ `document` が変更されている。
#[derive(Debug, Clone)]
pub struct CommentChange {
    pub role:     Role,
    pub document: ApprovalDocument,
    pub detail:   ApprovalDetail,
    /// 欄から外れた添付（呼び出し側がストレージから削除する）
    pub released: Vec<Attachment>,
}

impl CommentChange {
    pub fn touches_document(&self) -> bool {
        matches!(self.role, Role::Signer(_))
    }
}

/// コメント（と添付）を書き込めるか判定する
///
/// # Errors
///
/// - `NoCommentPermission`: 関係者ではない
/// - `SignerMismatch`: 決裁者と判定されたがスロットが一致しない
/// - `AttachmentSlotsFull` / `SignerAttachmentExists` / `ReferencerAttachmentExists`:
///   `with_attachment` が真で、役割の添付スロットに空きがない
pub fn authorize_comment(
    document: &ApprovalDocument,
    detail: &ApprovalDetail,
    actor: &Actor,
    with_attachment: bool,
) -> Result<Role, ApprovalError> {
    let role = Role::resolve(document, actor);
    match role {
        Role::None => return Err(ApprovalError::NoCommentPermission),
        Role::Signer(index) => {
            let assigned = document
                .signers()
                .slots()
                .get(index)
                .is_some_and(|slot| slot.is_assigned_to(&actor.name));
            if !assigned {
                return Err(ApprovalError::SignerMismatch);
            }
        }
        Role::Drafter | Role::Referencer => {}
    }

    if with_attachment {
        match role {
            Role::Drafter => detail.ensure_drafter_capacity(1)?,
            Role::Signer(_) => detail.ensure_signer_slot_free()?,
            Role::Referencer => detail.ensure_referencer_slot_free()?,
            Role::None => {}
        }
    }
    Ok(role)
}

/// コメントを書き込む
///
/// 既存のコメントは上書きする。`attachment` には保存済みファイルの情報を渡す
/// （`info` は役割から決まるラベルで上書きする）。
pub fn add_comment(
    document: ApprovalDocument,
    detail: ApprovalDetail,
    actor: &Actor,
    text: String,
    attachment: Option<Attachment>,
    now: DateTime<Utc>,
) -> Result<CommentChange, ApprovalError> {
    let role = authorize_comment(&document, &detail, actor, attachment.is_some())?;
    let (document, mut detail) = write_remark(document, detail, role, actor, Some(text), now)?;

    if let Some(attachment) = attachment {
        let attachment = Attachment {
            info: role.attachment_info(actor),
            ..attachment
        };
        detail = match role {
            Role::Drafter => detail.attach_drafter_file(attachment, now)?,
            Role::Signer(_) => detail.attach_signer_file(attachment, now)?,
            Role::Referencer => detail.attach_referencer_file(attachment, now)?,
            Role::None => return Err(ApprovalError::NoCommentPermission),
        };
    }

    Ok(CommentChange {
        role,
        document,
        detail,
        released: Vec::new(),
    })
}

/// コメントを書き換える（添付は変更しない）
pub fn update_comment(
    document: ApprovalDocument,
    detail: ApprovalDetail,
    actor: &Actor,
    text: String,
    now: DateTime<Utc>,
) -> Result<CommentChange, ApprovalError> {
    let role = authorize_comment(&document, &detail, actor, false)?;
    let (document, detail) = write_remark(document, detail, role, actor, Some(text), now)?;
    Ok(CommentChange {
        role,
        document,
        detail,
        released: Vec::new(),
    })
}

/// コメントを削除する
///
/// 決裁者・参照者は自分の役割の添付スロットも空にする。外した添付は
/// `released` で返すので、呼び出し側がストレージ上のファイルを削除する（失敗しても続行する）。
/// 起案者の添付スロットは変更しない。
pub fn delete_comment(
    document: ApprovalDocument,
    detail: ApprovalDetail,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<CommentChange, ApprovalError> {
    let role = authorize_comment(&document, &detail, actor, false)?;
    let (document, mut detail) = write_remark(document, detail, role, actor, None, now)?;

    let released: Vec<Attachment> = match role {
        Role::Signer(_) => detail.take_signer_attachment().into_iter().collect(),
        Role::Referencer => detail.take_referencer_attachment().into_iter().collect(),
        Role::Drafter | Role::None => Vec::new(),
    };

    Ok(CommentChange {
        role,
        document,
        detail,
        released,
    })
}

fn write_remark(
    document: ApprovalDocument,
    mut detail: ApprovalDetail,
    role: Role,
    actor: &Actor,
    remark: Option<String>,
    now: DateTime<Utc>,
) -> Result<(ApprovalDocument, ApprovalDetail), ApprovalError> {
    let document = match role {
        Role::Signer(index) => {
            document.with_signer_remark(index, &actor.name, &actor.id, remark, now)?
        }
        Role::Drafter => {
            detail.set_drafter_remark(remark);
            document
        }
        Role::Referencer => {
            detail.set_reference_remark(remark);
            document
        }
        Role::None => return Err(ApprovalError::NoCommentPermission),
    };
    detail.record_update(&actor.id, now);
    Ok((document, detail))
}
