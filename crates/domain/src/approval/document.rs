//! # 決裁文書
//!
//! 決裁ライン・参照者・状態を持つ集約。起案者が作成し、決裁者の決裁・却下と
//! 起案者の取り消しによって状態が遷移する。
//!
//! 状態遷移は ADT で表現し、「次の決裁者」は進行中の状態にだけ存在する。
//!
//! ```text
//! Draft ──submit──▶ InProgress ──approve(最終)──▶ Completed
//!   ▲                 │  │
//!   └────cancel───────┘  └──reject──▶ Rejected
//! ```
//!
//! ## 楽観的ロック
//!
//! 遷移のたびに `version` をインクリメントする。リポジトリは更新前の version と
//! DB 上の version を比較し、競合時は更新しない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use super::{
    error::ApprovalError,
    signer::{SignerChain, SignerSlot},
};
use crate::{
    DomainError,
    member::{Member, MemberId},
    value_objects::{MemberName, ReferenceNames, Version},
};

define_uuid_id! {
    /// 決裁文書番号
    pub struct ApprovalNo;
}

/// 決裁文書ステータス
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalStatus {
    /// 下書き（一時保存）
    Draft,
    /// 決裁中
    InProgress,
    /// 却下
    Rejected,
    /// 決裁完了
    Completed,
}

impl ApprovalStatus {
    /// DB・API で使うコード値
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// 画面表示用のラベル
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "下書き",
            Self::InProgress => "進行中",
            Self::Rejected => "却下",
            Self::Completed => "完了",
        }
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "in_progress" => Ok(Self::InProgress),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            _ => Err(DomainError::Validation(format!(
                "不正な決裁文書ステータス: {}",
                s
            ))),
        }
    }
}

/// 決裁文書の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalState {
    /// 下書き
    Draft,
    /// 決裁中
    InProgress(InProgressState),
    /// 却下
    Rejected(ClosedState),
    /// 決裁完了
    Completed(ClosedState),
}

/// InProgress 状態の固有フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InProgressState {
    /// 上申日時
    pub started_at:  DateTime<Utc>,
    /// 次に決裁すべき決裁者（最初の未決裁スロットの決裁者と常に一致）
    pub next_signer: MemberName,
}

/// Rejected / Completed 共通の終了状態フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedState {
    pub started_at: DateTime<Utc>,
    pub ended_at:   DateTime<Utc>,
}

/// 起案者情報
///
/// 起案時点のメンバー情報のスナップショット。後からメンバー情報が変わっても追従しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drafter {
    pub id:         MemberId,
    pub name:       MemberName,
    pub department: String,
    pub position:   String,
}

impl From<&Member> for Drafter {
    fn from(member: &Member) -> Self {
        Self {
            id:         member.id.clone(),
            name:       member.name.clone(),
            department: member.department.clone(),
            position:   member.position.clone(),
        }
    }
}

/// 決裁文書エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalDocument {
    approval_no: ApprovalNo,
    drafter:     Drafter,
    signers:     SignerChain,
    references:  ReferenceNames,
    version:     Version,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
    updated_by:  MemberId,
    state:       ApprovalState,
}

/// 決裁文書の新規作成パラメータ
pub struct NewApprovalDocument {
    pub approval_no: ApprovalNo,
    pub drafter:     Drafter,
    pub signers:     SignerChain,
    pub references:  ReferenceNames,
    pub now:         DateTime<Utc>,
}

/// 決裁文書の DB 復元パラメータ
///
/// DB のフラット構造をそのまま表す。`from_db()` で不変条件を検証して ADT に変換する。
pub struct ApprovalDocumentRecord {
    pub approval_no: ApprovalNo,
    pub drafter:     Drafter,
    pub signers:     [SignerSlot; super::MAX_SIGNERS],
    pub references:  ReferenceNames,
    pub status:      ApprovalStatus,
    pub next_signer: Option<MemberName>,
    pub started_at:  Option<DateTime<Utc>>,
    pub ended_at:    Option<DateTime<Utc>>,
    pub version:     Version,
    pub created_at:  DateTime<Utc>,
    pub updated_at:  DateTime<Utc>,
    pub updated_by:  MemberId,
}

fn invariant(message: &str) -> DomainError {
    DomainError::Validation(message.to_string())
}

impl ApprovalDocument {
    /// 下書きとして新しい決裁文書を作成する
    pub fn new(params: NewApprovalDocument) -> Self {
        Self {
            approval_no: params.approval_no,
            updated_by:  params.drafter.id.clone(),
            drafter:     params.drafter,
            signers:     params.signers,
            references:  params.references,
            version:     Version::initial(),
            created_at:  params.now,
            updated_at:  params.now,
            state:       ApprovalState::Draft,
        }
    }

    /// 既存のデータから復元する
    ///
    /// # Errors
    ///
    /// - 決裁ラインの不変条件違反
    /// - 状態と `started_at` / `ended_at` / `next_signer` の組み合わせが不正
    pub fn from_db(record: ApprovalDocumentRecord) -> Result<Self, DomainError> {
        let signers = SignerChain::from_slots(record.signers)?;

        let state = match record.status {
            ApprovalStatus::Draft => {
                if signers.has_any_acted() {
                    return Err(invariant("下書きに決裁済みスロットがあります"));
                }
                if record.next_signer.is_some() {
                    return Err(invariant("下書きに次の決裁者が設定されています"));
                }
                ApprovalState::Draft
            }
            ApprovalStatus::InProgress => {
                let started_at = record
                    .started_at
                    .ok_or_else(|| invariant("InProgress 文書には started_at が必要です"))?;
                let next_signer = record
                    .next_signer
                    .ok_or_else(|| invariant("InProgress 文書には次の決裁者が必要です"))?;
                if signers.first_pending_name() != Some(&next_signer) {
                    return Err(invariant(
                        "次の決裁者が最初の未決裁スロットの決裁者と一致しません",
                    ));
                }
                ApprovalState::InProgress(InProgressState {
                    started_at,
                    next_signer,
                })
            }
            ApprovalStatus::Rejected | ApprovalStatus::Completed => {
                if record.next_signer.is_some() {
                    return Err(invariant("終了した文書に次の決裁者が設定されています"));
                }
                let started_at = record
                    .started_at
                    .ok_or_else(|| invariant("終了した文書には started_at が必要です"))?;
                let ended_at = record
                    .ended_at
                    .ok_or_else(|| invariant("終了した文書には ended_at が必要です"))?;
                let closed = ClosedState {
                    started_at,
                    ended_at,
                };
                if record.status == ApprovalStatus::Completed {
                    if !signers.is_exhausted() {
                        return Err(invariant("完了文書に未決裁の決裁者がいます"));
                    }
                    ApprovalState::Completed(closed)
                } else {
                    if !signers.has_any_acted() {
                        return Err(invariant("却下文書に却下した決裁者の記録がありません"));
                    }
                    ApprovalState::Rejected(closed)
                }
            }
        };

        Ok(Self {
            approval_no: record.approval_no,
            drafter: record.drafter,
            signers,
            references: record.references,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
            updated_by: record.updated_by,
            state,
        })
    }

    // Getters

    pub fn approval_no(&self) -> &ApprovalNo {
        &self.approval_no
    }

    pub fn drafter(&self) -> &Drafter {
        &self.drafter
    }

    pub fn signers(&self) -> &SignerChain {
        &self.signers
    }

    pub fn references(&self) -> &ReferenceNames {
        &self.references
    }

    pub fn status(&self) -> ApprovalStatus {
        match &self.state {
            ApprovalState::Draft => ApprovalStatus::Draft,
            ApprovalState::InProgress(_) => ApprovalStatus::InProgress,
            ApprovalState::Rejected(_) => ApprovalStatus::Rejected,
            ApprovalState::Completed(_) => ApprovalStatus::Completed,
        }
    }

    pub fn state(&self) -> &ApprovalState {
        &self.state
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

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            ApprovalState::Draft => None,
            ApprovalState::InProgress(s) => Some(s.started_at),
            ApprovalState::Rejected(s) | ApprovalState::Completed(s) => Some(s.started_at),
        }
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            ApprovalState::Rejected(s) | ApprovalState::Completed(s) => Some(s.ended_at),
            _ => None,
        }
    }

    /// 次に決裁すべき決裁者（InProgress のときのみ）
    pub fn next_signer(&self) -> Option<&MemberName> {
        match &self.state {
            ApprovalState::InProgress(s) => Some(&s.next_signer),
            _ => None,
        }
    }

    /// 一覧・ダッシュボードに表示する「現在の決裁者」
    ///
    /// - 却下: 最後に決裁日時を記録した決裁者（却下した本人）
    /// - それ以外: 最初の未決裁スロットの決裁者
    ///
    /// 該当者がいなければ `None`。
    pub fn current_signer(&self) -> Option<&MemberName> {
        match &self.state {
            ApprovalState::Rejected(_) => self.signers.latest_acted_name(),
            _ => self.signers.first_pending_name(),
        }
    }

    pub fn is_drafted_by(&self, member_id: &MemberId) -> bool {
        &self.drafter.id == member_id
    }

    // 状態遷移

    /// 下書きの決裁ライン・参照者を差し替える（一時保存）
    ///
    /// # Errors
    ///
    /// - `NotDrafter`: 起案者以外
    /// - `InvalidStage`: 下書き以外
    pub fn revise_draft(
        self,
        signers: SignerChain,
        references: ReferenceNames,
        actor_id: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<Self, ApprovalError> {
        if !self.is_drafted_by(actor_id) {
            return Err(ApprovalError::NotDrafter);
        }
        if !matches!(self.state, ApprovalState::Draft) {
            return Err(ApprovalError::InvalidStage);
        }
        Ok(Self {
            signers,
            references,
            version: self.version.next(),
            updated_at: now,
            updated_by: actor_id.clone(),
            ..self
        })
    }

    /// 上申する（下書き → 決裁中、または未着手の決裁中文書の再上申）
    ///
    /// 決裁ラインを新しく設定し、先頭の決裁者を次の決裁者にする。
    ///
    /// # Errors
    ///
    /// - `Validation`: 決裁者が 1 人もいない
    /// - `NotDrafter`: 起案者以外
    /// - `AlreadyProgressed`: 決裁中で既に誰かが決裁している
    /// - `InvalidStage`: 却下・完了済み
    pub fn submit(
        self,
        signers: SignerChain,
        references: ReferenceNames,
        actor_id: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !self.is_drafted_by(actor_id) {
            return Err(ApprovalError::NotDrafter.into());
        }
        match &self.state {
            ApprovalState::Draft => {}
            ApprovalState::InProgress(_) if self.signers.has_any_acted() => {
                return Err(ApprovalError::AlreadyProgressed.into());
            }
            ApprovalState::InProgress(_) => {}
            ApprovalState::Rejected(_) | ApprovalState::Completed(_) => {
                return Err(ApprovalError::InvalidStage.into());
            }
        }
        let next_signer = signers
            .first_pending_name()
            .cloned()
            .ok_or_else(|| DomainError::Validation("決裁者を 1 人以上指定してください".to_string()))?;

        Ok(Self {
            signers,
            references,
            version: self.version.next(),
            updated_at: now,
            updated_by: actor_id.clone(),
            state: ApprovalState::InProgress(InProgressState {
                started_at: now,
                next_signer,
            }),
            ..self
        })
    }

    /// 決裁する
    ///
    /// ## 処理フロー
    ///
    /// 1. 操作者が次の決裁者でなければ `NotCurrentSigner`
    /// 2. 操作者の最初の未決裁スロットを探す（なければ `AlreadyActedOrInvalidStage`）
    /// 3. 決裁日時を記録
    /// 4. 次のスロットに決裁者がいれば次の決裁者へ、いなければ完了
    pub fn approve(
        self,
        actor_name: &MemberName,
        actor_id: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<Self, ApprovalError> {
        let started_at = self.ensure_next_signer(actor_name)?;
        let index = self
            .signers
            .pending_position_of(actor_name)
            .ok_or(ApprovalError::AlreadyActedOrInvalidStage)?;

        let mut signers = self.signers.clone();
        signers.record_action(index, now);

        let state = match signers.assigned_after(index).cloned() {
            Some(next_signer) => ApprovalState::InProgress(InProgressState {
                started_at,
                next_signer,
            }),
            None => ApprovalState::Completed(ClosedState {
                started_at,
                ended_at: now,
            }),
        };

        Ok(Self {
            signers,
            version: self.version.next(),
            updated_at: now,
            updated_by: actor_id.clone(),
            state,
            ..self
        })
    }

    /// 却下する
    ///
    /// 却下した決裁者のスロットに決裁日時を記録し、以降のスロットには進めない。
    pub fn reject(
        self,
        actor_name: &MemberName,
        actor_id: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<Self, ApprovalError> {
        let started_at = self.ensure_next_signer(actor_name)?;
        let index = self
            .signers
            .pending_position_of(actor_name)
            .ok_or(ApprovalError::AlreadyActedOrInvalidStage)?;

        let mut signers = self.signers.clone();
        signers.record_action(index, now);

        Ok(Self {
            signers,
            version: self.version.next(),
            updated_at: now,
            updated_by: actor_id.clone(),
            state: ApprovalState::Rejected(ClosedState {
                started_at,
                ended_at: now,
            }),
            ..self
        })
    }

    /// 上申を取り消して下書きに戻す
    ///
    /// 最初の決裁者が決裁する前に限り実行できる。
    pub fn cancel(self, actor_id: &MemberId, now: DateTime<Utc>) -> Result<Self, ApprovalError> {
        if !self.is_drafted_by(actor_id) {
            return Err(ApprovalError::NotDrafter);
        }
        if !matches!(self.state, ApprovalState::InProgress(_)) {
            return Err(ApprovalError::InvalidStage);
        }
        let slots = self.signers.slots();
        if slots[0].has_acted() {
            return Err(ApprovalError::AlreadyProgressed);
        }
        // 先頭が未決裁なら後続も未決裁のはずだが、ここでも独立に確認する
        if slots[1..].iter().any(SignerSlot::has_acted) {
            return Err(ApprovalError::AlreadyProgressed);
        }

        Ok(Self {
            version: self.version.next(),
            updated_at: now,
            updated_by: actor_id.clone(),
            state: ApprovalState::Draft,
            ..self
        })
    }

    /// 決裁者コメントを書き込む（`None` で削除）
    ///
    /// # Errors
    ///
    /// `index` のスロットに操作者が割り当てられていなければ `SignerMismatch`。
    pub fn with_signer_remark(
        self,
        index: usize,
        actor_name: &MemberName,
        actor_id: &MemberId,
        remark: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ApprovalError> {
        let assigned = self
            .signers
            .slots()
            .get(index)
            .is_some_and(|slot| slot.is_assigned_to(actor_name));
        if !assigned {
            return Err(ApprovalError::SignerMismatch);
        }

        let mut signers = self.signers.clone();
        signers.set_remark(index, remark);

        Ok(Self {
            signers,
            version: self.version.next(),
            updated_at: now,
            updated_by: actor_id.clone(),
            ..self
        })
    }

    fn ensure_next_signer(&self, actor_name: &MemberName) -> Result<DateTime<Utc>, ApprovalError> {
        match &self.state {
            ApprovalState::InProgress(s) if &s.next_signer == actor_name => Ok(s.started_at),
            _ => Err(ApprovalError::NotCurrentSigner),
        }
    }
}
