//! # 一覧とダッシュボードの射影
//!
//! 進捗ビュー（全体・進行中・下書き・却下・完了）ごとの絞り込み、
//! 登録日・キーワードによるフィルタ、並び替えとページングを行う純粋関数群。
//!
//! リポジトリが関係者で絞り込んだ結果を返す前提でも、ここで改めて関係者判定と
//! 「下書きは起案者本人にしか見えない」ルールを適用する。

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use serde::Serialize;

use super::{ApprovalDetail, ApprovalDocument, ApprovalNo, ApprovalState, ApprovalStatus};
use crate::{
    DomainError,
    member::{Actor, MemberId},
    value_objects::{FormType, MemberName},
};

/// ダッシュボードに表示する起案文書の件数
pub const DASHBOARD_SUBMITTED_LIMIT: usize = 5;

/// 進捗ビュー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressView {
    All,
    InProgress,
    Draft,
    Rejected,
    Completed,
}

impl ProgressView {
    fn admits(&self, status: ApprovalStatus) -> bool {
        match self {
            Self::All => true,
            Self::InProgress => status == ApprovalStatus::InProgress,
            Self::Draft => status == ApprovalStatus::Draft,
            Self::Rejected => status == ApprovalStatus::Rejected,
            Self::Completed => status == ApprovalStatus::Completed,
        }
    }
}

impl FromStr for ProgressView {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "in-progress" => Ok(Self::InProgress),
            "draft" => Ok(Self::Draft),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            _ => Err(DomainError::Validation(format!("不明な進捗ビュー: {}", s))),
        }
    }
}

/// 一覧の絞り込み条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// 登録日の下限（この日を含む）
    pub from:    Option<NaiveDate>,
    /// 登録日の上限（この日を含む）
    pub to:      Option<NaiveDate>,
    keyword: Option<String>,
}

impl ListFilter {
    /// キーワードは trim し、空なら条件なしとして扱う
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>, keyword: Option<&str>) -> Self {
        let keyword = keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);
        Self { from, to, keyword }
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    fn matches(&self, document: &ApprovalDocument, detail: &ApprovalDetail) -> bool {
        let reg_date = document.created_at().date_naive();
        if self.from.is_some_and(|from| reg_date < from) {
            return false;
        }
        if self.to.is_some_and(|to| reg_date > to) {
            return false;
        }
        let Some(keyword) = &self.keyword else {
            return true;
        };

        let status = document.status();
        let drafter = document.drafter();
        let signers = document.signers().joined_names();
        [
            detail.title(),
            detail.form_type().as_str(),
            drafter.name.as_str(),
            drafter.department.as_str(),
            signers.as_str(),
            status.as_str(),
            status.label(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(keyword.as_str()))
    }
}

/// 一覧画面の 1 行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalSummary {
    pub approval_no:        ApprovalNo,
    pub reg_date:           DateTime<Utc>,
    pub title:              String,
    pub form_type:          FormType,
    pub drafter_department: String,
    pub drafter_name:       MemberName,
    pub current_signer:     Option<MemberName>,
    pub status:             ApprovalStatus,
}

impl ApprovalSummary {
    pub fn project(document: &ApprovalDocument, detail: &ApprovalDetail) -> Self {
        Self {
            approval_no:        document.approval_no().clone(),
            reg_date:           document.created_at(),
            title:              detail.title().to_string(),
            form_type:          detail.form_type().clone(),
            drafter_department: document.drafter().department.clone(),
            drafter_name:       document.drafter().name.clone(),
            current_signer:     document.current_signer().cloned(),
            status:             document.status(),
        }
    }
}

/// ページング結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 0 始まりのページ番号
    pub page:  usize,
    pub size:  usize,
    /// 絞り込み後の総件数
    pub total: usize,
}

impl<T> Page<T> {
    /// 絞り込み済みの全件から 1 ページ分を切り出す
    pub fn paginate(all: Vec<T>, page: usize, size: usize) -> Self {
        let size = size.max(1);
        let total = all.len();
        let items = all
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .collect();
        Self {
            items,
            page,
            size,
            total,
        }
    }
}

/// 一覧に表示してよい関係者か
///
/// - 起案者（ID で照合）
/// - 参照者
/// - 決裁済みスロット、または決裁中の文書で現在の未決裁スロットに名前がある決裁者
pub fn participates_in_list(document: &ApprovalDocument, actor: &Actor) -> bool {
    if document.is_drafted_by(&actor.id) || document.references().contains(&actor.name) {
        return true;
    }
    let slots = document.signers().slots();
    let pending_index = match document.state() {
        ApprovalState::InProgress(_) => slots.iter().position(|s| !s.has_acted()),
        _ => None,
    };
    slots.iter().enumerate().any(|(index, slot)| {
        slot.is_assigned_to(&actor.name) && (slot.has_acted() || pending_index == Some(index))
    })
}

/// 進捗ビューに表示するか
///
/// 下書きはほかの条件にかかわらず起案者本人にしか見せない。
pub fn is_visible(document: &ApprovalDocument, actor: &Actor, view: ProgressView) -> bool {
    if document.status() == ApprovalStatus::Draft && !document.is_drafted_by(&actor.id) {
        return false;
    }
    view.admits(document.status()) && participates_in_list(document, actor)
}

/// 進捗ビューの一覧を作る
///
/// 関係者判定・ビュー・フィルタを適用し、登録日の新しい順に並べてからページングする。
pub fn list_by_view(
    entries: &[(ApprovalDocument, ApprovalDetail)],
    actor: &Actor,
    view: ProgressView,
    filter: &ListFilter,
    page: usize,
    size: usize,
) -> Page<ApprovalSummary> {
    let rows = entries
        .iter()
        .filter(|(document, detail)| {
            is_visible(document, actor, view) && filter.matches(document, detail)
        })
        .sorted_by(|(a, _), (b, _)| b.created_at().cmp(&a.created_at()))
        .map(|(document, detail)| ApprovalSummary::project(document, detail))
        .collect();
    Page::paginate(rows, page, size)
}

/// ダッシュボードの件数（起案者本人の文書のみ）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub total:       usize,
    pub in_progress: usize,
    pub completed:   usize,
}

impl DashboardCounts {
    pub fn tally<'a>(
        documents: impl IntoIterator<Item = &'a ApprovalDocument>,
        drafter_id: &MemberId,
    ) -> Self {
        documents
            .into_iter()
            .filter(|d| d.is_drafted_by(drafter_id))
            .fold(Self::default(), |mut counts, d| {
                counts.total += 1;
                match d.status() {
                    ApprovalStatus::InProgress => counts.in_progress += 1,
                    ApprovalStatus::Completed => counts.completed += 1,
                    ApprovalStatus::Draft | ApprovalStatus::Rejected => {}
                }
                counts
            })
    }
}

/// 起案者本人の新しい文書から `DASHBOARD_SUBMITTED_LIMIT` 件
pub fn recent_submitted(
    entries: &[(ApprovalDocument, ApprovalDetail)],
    drafter_id: &MemberId,
) -> Vec<ApprovalSummary> {
    entries
        .iter()
        .filter(|(document, _)| document.is_drafted_by(drafter_id))
        .sorted_by(|(a, _), (b, _)| b.created_at().cmp(&a.created_at()))
        .take(DASHBOARD_SUBMITTED_LIMIT)
        .map(|(document, detail)| ApprovalSummary::project(document, detail))
        .collect()
}

/// 自分が次の決裁者になっている決裁中の文書（新しい順）
pub fn pending_for(
    entries: &[(ApprovalDocument, ApprovalDetail)],
    signer: &MemberName,
) -> Vec<ApprovalSummary> {
    entries
        .iter()
        .filter(|(document, _)| document.next_signer() == Some(signer))
        .sorted_by(|(a, _), (b, _)| b.created_at().cmp(&a.created_at()))
        .map(|(document, detail)| ApprovalSummary::project(document, detail))
        .collect()
}
