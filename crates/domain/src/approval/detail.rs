//! # 決裁文書の本文と添付
//!
//! 決裁文書（[`ApprovalDocument`](super::ApprovalDocument)）と 1:1 で対応する本文・添付・コメント欄。
//!
//! 添付ファイルは役割ごとに独立したスロットを持つ。
//!
//! | スロット | 件数 | 割り当て |
//! |---------|------|---------|
//! | 起案者 | 5 | 最初の空きスロット |
//! | 決裁者 | 1 | 文書ごとに 1 件のみ（誰が追加したかは問わない） |
//! | 参照者 | 1 | 文書ごとに 1 件のみ |

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};

use super::{ApprovalError, ApprovalNo, FormNo};
use crate::{
    DomainError,
    member::MemberId,
    value_objects::{FormType, Version},
};

/// 起案者の添付スロット数
pub const MAX_DRAFTER_ATTACHMENTS: usize = 5;

/// 添付ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// ストレージ上のパス
    pub path:      String,
    /// 保存時のファイル名（`{epoch_millis}_{元のファイル名}`）
    pub file_name: String,
    /// 表示用ラベル（「起案」「Alice（決裁者）」など）
    pub info:      String,
}

impl Attachment {
    /// ダウンロード時に提示する元のファイル名
    ///
    /// 保存名の先頭に付与したタイムスタンプを取り除く。
    pub fn original_name(&self) -> &str {
        match self.file_name.split_once('_') {
            Some((prefix, rest)) if prefix.chars().all(|c| c.is_ascii_digit()) => rest,
            _ => &self.file_name,
        }
    }
}

/// 添付スロットの指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentSlot {
    /// 起案者スロット（0 始まりの位置）
    Drafter(usize),
    Signer,
    Referencer,
}

impl FromStr for AttachmentSlot {
    type Err = ApprovalError;

    /// `drafter1`〜`drafter5` / `signer` / `referencer` をパースする
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signer" => Ok(Self::Signer),
            "referencer" => Ok(Self::Referencer),
            _ => s
                .strip_prefix("drafter")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| (1..=MAX_DRAFTER_ATTACHMENTS).contains(n))
                .map(|n| Self::Drafter(n - 1))
                .ok_or(ApprovalError::InvalidAttachmentSlot),
        }
    }
}

impl fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drafter(index) => write!(f, "drafter{}", index + 1),
            Self::Signer => f.write_str("signer"),
            Self::Referencer => f.write_str("referencer"),
        }
    }
}

/// 決裁文書の本文と添付
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalDetail {
    approval_no: ApprovalNo,
    form_no: FormNo,
    form_type: FormType,
    title: String,
    body: String,
    drafter_attachments: [Option<Attachment>; MAX_DRAFTER_ATTACHMENTS],
    signer_attachment: Option<Attachment>,
    referencer_attachment: Option<Attachment>,
    drafter_remark: Option<String>,
    reference_remark: Option<String>,
    version: Version,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    updated_by: MemberId,
}

/// 本文の新規作成パラメータ
pub struct NewApprovalDetail {
    pub approval_no: ApprovalNo,
    pub form_no:     FormNo,
    pub form_type:   FormType,
    pub title:       String,
    pub body:        String,
    pub created_by:  MemberId,
    pub now:         DateTime<Utc>,
}

/// 本文の DB 復元パラメータ
pub struct ApprovalDetailRecord {
    pub approval_no: ApprovalNo,
    pub form_no: FormNo,
    pub form_type: FormType,
    pub title: String,
    pub body: String,
    pub drafter_attachments: [Option<Attachment>; MAX_DRAFTER_ATTACHMENTS],
    pub signer_attachment: Option<Attachment>,
    pub referencer_attachment: Option<Attachment>,
    pub drafter_remark: Option<String>,
    pub reference_remark: Option<String>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: MemberId,
}

fn validate_title(title: String) -> Result<String, DomainError> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(DomainError::Validation("件名は必須です".to_string()));
    }
    if title.chars().count() > 200 {
        return Err(DomainError::Validation(
            "件名は 200 文字以内である必要があります".to_string(),
        ));
    }
    Ok(title)
}

impl ApprovalDetail {
    /// # Errors
    ///
    /// 件名が空、または 200 文字を超える場合は `DomainError::Validation`。
    pub fn new(params: NewApprovalDetail) -> Result<Self, DomainError> {
        Ok(Self {
            approval_no: params.approval_no,
            form_no: params.form_no,
            form_type: params.form_type,
            title: validate_title(params.title)?,
            body: params.body,
            drafter_attachments: Default::default(),
            signer_attachment: None,
            referencer_attachment: None,
            drafter_remark: None,
            reference_remark: None,
            version: Version::initial(),
            created_at: params.now,
            updated_at: params.now,
            updated_by: params.created_by,
        })
    }

    pub fn from_db(record: ApprovalDetailRecord) -> Self {
        Self {
            approval_no: record.approval_no,
            form_no: record.form_no,
            form_type: record.form_type,
            title: record.title,
            body: record.body,
            drafter_attachments: record.drafter_attachments,
            signer_attachment: record.signer_attachment,
            referencer_attachment: record.referencer_attachment,
            drafter_remark: record.drafter_remark,
            reference_remark: record.reference_remark,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
            updated_by: record.updated_by,
        }
    }

    // Getters

    pub fn approval_no(&self) -> &ApprovalNo {
        &self.approval_no
    }

    pub fn form_no(&self) -> &FormNo {
        &self.form_no
    }

    pub fn form_type(&self) -> &FormType {
        &self.form_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn drafter_attachments(&self) -> &[Option<Attachment>; MAX_DRAFTER_ATTACHMENTS] {
        &self.drafter_attachments
    }

    pub fn signer_attachment(&self) -> Option<&Attachment> {
        self.signer_attachment.as_ref()
    }

    pub fn referencer_attachment(&self) -> Option<&Attachment> {
        self.referencer_attachment.as_ref()
    }

    pub fn drafter_remark(&self) -> Option<&str> {
        self.drafter_remark.as_deref()
    }

    pub fn reference_remark(&self) -> Option<&str> {
        self.reference_remark.as_deref()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn updated_by(&self) -> &MemberId {
        &self.updated_by
    }

    /// 指定スロットの添付
    pub fn attachment(&self, slot: AttachmentSlot) -> Option<&Attachment> {
        match slot {
            AttachmentSlot::Drafter(index) => {
                self.drafter_attachments.get(index).and_then(Option::as_ref)
            }
            AttachmentSlot::Signer => self.signer_attachment.as_ref(),
            AttachmentSlot::Referencer => self.referencer_attachment.as_ref(),
        }
    }

    /// 登録済みの添付すべて（文書削除時のファイル掃除用）
    pub fn all_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.drafter_attachments
            .iter()
            .flatten()
            .chain(self.signer_attachment.iter())
            .chain(self.referencer_attachment.iter())
    }

    pub fn free_drafter_slots(&self) -> usize {
        self.drafter_attachments
            .iter()
            .filter(|a| a.is_none())
            .count()
    }

    // 更新

    /// 本文を差し替える（様式・件名・本文）
    pub fn revise(
        self,
        form_no: FormNo,
        form_type: FormType,
        title: String,
        body: String,
        actor_id: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            form_no,
            form_type,
            title: validate_title(title)?,
            body,
            version: self.version.next(),
            updated_at: now,
            updated_by: actor_id.clone(),
            ..self
        })
    }

    /// 起案者の添付を `count` 件追加できるか確認する
    ///
    /// ファイルを保存する前に呼び、書き込み後に失敗しないようにする。
    pub fn ensure_drafter_capacity(&self, count: usize) -> Result<(), ApprovalError> {
        if count > self.free_drafter_slots() {
            return Err(ApprovalError::AttachmentSlotsFull);
        }
        Ok(())
    }

    /// 起案者の添付を最初の空きスロットに追加する
    pub fn attach_drafter_file(
        mut self,
        attachment: Attachment,
        now: DateTime<Utc>,
    ) -> Result<Self, ApprovalError> {
        let slot = self
            .drafter_attachments
            .iter_mut()
            .find(|a| a.is_none())
            .ok_or(ApprovalError::AttachmentSlotsFull)?;
        *slot = Some(attachment);
        self.touched(now);
        Ok(self)
    }

    /// 決裁者の添付が未登録か確認する
    pub fn ensure_signer_slot_free(&self) -> Result<(), ApprovalError> {
        if self.signer_attachment.is_some() {
            return Err(ApprovalError::SignerAttachmentExists);
        }
        Ok(())
    }

    /// 参照者の添付が未登録か確認する
    pub fn ensure_referencer_slot_free(&self) -> Result<(), ApprovalError> {
        if self.referencer_attachment.is_some() {
            return Err(ApprovalError::ReferencerAttachmentExists);
        }
        Ok(())
    }

    pub(crate) fn attach_signer_file(
        mut self,
        attachment: Attachment,
        now: DateTime<Utc>,
    ) -> Result<Self, ApprovalError> {
        self.ensure_signer_slot_free()?;
        self.signer_attachment = Some(attachment);
        self.touched(now);
        Ok(self)
    }

    pub(crate) fn attach_referencer_file(
        mut self,
        attachment: Attachment,
        now: DateTime<Utc>,
    ) -> Result<Self, ApprovalError> {
        self.ensure_referencer_slot_free()?;
        self.referencer_attachment = Some(attachment);
        self.touched(now);
        Ok(self)
    }

    /// 起案者の添付を 1 件外す
    ///
    /// 外した添付を返す。呼び出し側がストレージ上のファイルを削除する。
    pub fn detach_drafter_file(
        mut self,
        index: usize,
        actor_id: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<(Self, Attachment), ApprovalError> {
        let removed = self
            .drafter_attachments
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(ApprovalError::InvalidAttachmentSlot)?;
        self.touched(now);
        self.updated_by = actor_id.clone();
        Ok((self, removed))
    }

    pub(crate) fn set_drafter_remark(&mut self, remark: Option<String>) {
        self.drafter_remark = remark;
    }

    pub(crate) fn set_reference_remark(&mut self, remark: Option<String>) {
        self.reference_remark = remark;
    }

    pub(crate) fn take_signer_attachment(&mut self) -> Option<Attachment> {
        self.signer_attachment.take()
    }

    pub(crate) fn take_referencer_attachment(&mut self) -> Option<Attachment> {
        self.referencer_attachment.take()
    }

    pub(crate) fn record_update(&mut self, actor_id: &MemberId, now: DateTime<Utc>) {
        self.touched(now);
        self.updated_by = actor_id.clone();
    }

    fn touched(&mut self, now: DateTime<Utc>) {
        self.version = self.version.next();
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn detail() -> ApprovalDetail {
        ApprovalDetail::new(NewApprovalDetail {
            approval_no: ApprovalNo::new(),
            form_no:     FormNo::new(),
            form_type:   FormType::new("休暇届").unwrap(),
            title:       "夏季休暇".to_string(),
            body:        "<p>8/10〜8/14</p>".to_string(),
            created_by:  MemberId::new("drafter01").unwrap(),
            now:         now(),
        })
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
    }

    fn file(n: usize) -> Attachment {
        Attachment {
            path:      format!("/upload/{n}_a.pdf"),
            file_name: format!("{n}_a.pdf"),
            info:      "起案".to_string(),
        }
    }

    #[rstest]
    fn test_new_は空の件名を拒否する() {
        let result = ApprovalDetail::new(NewApprovalDetail {
            approval_no: ApprovalNo::new(),
            form_no:     FormNo::new(),
            form_type:   FormType::new("休暇届").unwrap(),
            title:       "   ".to_string(),
            body:        String::new(),
            created_by:  MemberId::new("drafter01").unwrap(),
            now:         now(),
        });

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[rstest]
    fn test_attach_drafter_file_は最初の空きスロットに入る(detail: ApprovalDetail) {
        let detail = detail
            .attach_drafter_file(file(1), now())
            .unwrap()
            .attach_drafter_file(file(2), now())
            .unwrap();
        let (detail, _) = detail
            .detach_drafter_file(0, &MemberId::new("drafter01").unwrap(), now())
            .unwrap();

        let detail = detail.attach_drafter_file(file(3), now()).unwrap();

        assert_eq!(detail.drafter_attachments()[0], Some(file(3)));
        assert_eq!(detail.drafter_attachments()[1], Some(file(2)));
        assert_eq!(detail.free_drafter_slots(), 3);
    }

    #[rstest]
    fn test_attach_drafter_file_6件目はattachment_slots_full(detail: ApprovalDetail) {
        let mut detail = detail;
        for n in 0..MAX_DRAFTER_ATTACHMENTS {
            detail = detail.attach_drafter_file(file(n), now()).unwrap();
        }

        assert_eq!(
            detail.ensure_drafter_capacity(1),
            Err(ApprovalError::AttachmentSlotsFull)
        );
        let result = detail.attach_drafter_file(file(6), now());
        assert_eq!(result.unwrap_err(), ApprovalError::AttachmentSlotsFull);
    }

    #[rstest]
    fn test_detach_drafter_file_空きスロットはinvalid_attachment_slot(detail: ApprovalDetail) {
        let result = detail.detach_drafter_file(2, &MemberId::new("drafter01").unwrap(), now());

        assert_eq!(result.unwrap_err(), ApprovalError::InvalidAttachmentSlot);
    }

    #[rstest]
    fn test_attach_signer_file_は1件まで(detail: ApprovalDetail) {
        let detail = detail.attach_signer_file(file(1), now()).unwrap();

        let result = detail.attach_signer_file(file(2), now());

        assert_eq!(result.unwrap_err(), ApprovalError::SignerAttachmentExists);
    }

    #[rstest]
    fn test_all_attachments_は全スロットの添付を返す(detail: ApprovalDetail) {
        let detail = detail
            .attach_drafter_file(file(1), now())
            .unwrap()
            .attach_signer_file(file(2), now())
            .unwrap()
            .attach_referencer_file(file(3), now())
            .unwrap();

        assert_eq!(detail.all_attachments().count(), 3);
    }

    #[rstest]
    #[case("drafter1", AttachmentSlot::Drafter(0))]
    #[case("drafter5", AttachmentSlot::Drafter(4))]
    #[case("signer", AttachmentSlot::Signer)]
    #[case("referencer", AttachmentSlot::Referencer)]
    fn test_attachment_slot_はスロット名をパースできる(
        #[case] raw: &str,
        #[case] expected: AttachmentSlot,
    ) {
        assert_eq!(raw.parse::<AttachmentSlot>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[rstest]
    #[case("drafter0")]
    #[case("drafter6")]
    #[case("drafter")]
    #[case("owner")]
    fn test_attachment_slot_不明なスロット名はエラー(#[case] raw: &str) {
        assert_eq!(
            raw.parse::<AttachmentSlot>(),
            Err(ApprovalError::InvalidAttachmentSlot)
        );
    }

    #[test]
    fn test_original_name_はタイムスタンプを除いた名前を返す() {
        let attachment = Attachment {
            path:      "/upload/1743490800000_見積書_v2.pdf".to_string(),
            file_name: "1743490800000_見積書_v2.pdf".to_string(),
            info:      "起案".to_string(),
        };

        assert_eq!(attachment.original_name(), "見積書_v2.pdf");
    }
}
