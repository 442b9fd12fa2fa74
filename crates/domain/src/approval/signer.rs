//! # 決裁ライン
//!
//! 最大 5 名の直列な決裁者スロット。各スロットは表示名・決裁日時・決裁者コメントを持つ。
//!
//! ## 不変条件
//!
//! - 割り当て済みスロットは先頭から詰めて並ぶ（空きスロットの後ろに決裁者はいない）
//! - 決裁済みスロットは先頭からの連続した範囲に限られる
//! - 決裁済みスロットには必ず決裁者が割り当てられている

use chrono::{DateTime, Utc};

use crate::{DomainError, value_objects::MemberName};

/// 決裁ラインのスロット数
pub const MAX_SIGNERS: usize = 5;

/// リクエストや様式から受け取る決裁者の並び
pub type SignerNames = [Option<MemberName>; MAX_SIGNERS];

/// 決裁者スロット
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignerSlot {
    name:     Option<MemberName>,
    acted_at: Option<DateTime<Utc>>,
    remark:   Option<String>,
}

impl SignerSlot {
    /// 永続化された値からスロットを組み立てる
    pub fn new(
        name: Option<MemberName>,
        acted_at: Option<DateTime<Utc>>,
        remark: Option<String>,
    ) -> Self {
        Self {
            name,
            acted_at,
            remark,
        }
    }

    pub fn name(&self) -> Option<&MemberName> {
        self.name.as_ref()
    }

    pub fn acted_at(&self) -> Option<DateTime<Utc>> {
        self.acted_at
    }

    pub fn remark(&self) -> Option<&str> {
        self.remark.as_deref()
    }

    pub fn is_assigned_to(&self, name: &MemberName) -> bool {
        self.name.as_ref() == Some(name)
    }

    pub fn has_acted(&self) -> bool {
        self.acted_at.is_some()
    }
}

/// 決裁ライン
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignerChain([SignerSlot; MAX_SIGNERS]);

impl SignerChain {
    /// 未決裁の決裁ラインを割り当てる
    ///
    /// # Errors
    ///
    /// 空きスロットの後ろに決裁者がいる場合は `DomainError::Validation`。
    pub fn assign(names: SignerNames) -> Result<Self, DomainError> {
        let chain = Self(names.map(|name| SignerSlot {
            name,
            ..SignerSlot::default()
        }));
        if !chain.is_gap_free() {
            return Err(DomainError::Validation(
                "決裁ラインの途中に空きを挟むことはできません".to_string(),
            ));
        }
        Ok(chain)
    }

    /// 永続化されたスロットから復元する
    ///
    /// # Errors
    ///
    /// モジュール冒頭の不変条件を満たさない場合は `DomainError::Validation`。
    pub fn from_slots(slots: [SignerSlot; MAX_SIGNERS]) -> Result<Self, DomainError> {
        let chain = Self(slots);
        if !chain.is_gap_free() {
            return Err(DomainError::Validation(
                "決裁ラインの途中に空きスロットがあります".to_string(),
            ));
        }
        if chain.0.iter().any(|s| s.has_acted() && s.name.is_none()) {
            return Err(DomainError::Validation(
                "決裁者のいないスロットに決裁日時があります".to_string(),
            ));
        }
        if !chain.is_acted_prefix() {
            return Err(DomainError::Validation(
                "決裁日時が先頭から連続していません".to_string(),
            ));
        }
        Ok(chain)
    }

    pub fn slots(&self) -> &[SignerSlot; MAX_SIGNERS] {
        &self.0
    }

    /// 割り当て済みの決裁者名（順序どおり）
    pub fn names(&self) -> impl Iterator<Item = &MemberName> {
        self.0.iter().filter_map(|s| s.name.as_ref())
    }

    /// 決裁者が 1 人もいないか
    pub fn is_unassigned(&self) -> bool {
        self.0.iter().all(|s| s.name.is_none())
    }

    /// いずれかの決裁者が決裁済みか
    pub fn has_any_acted(&self) -> bool {
        self.0.iter().any(SignerSlot::has_acted)
    }

    /// 最初の未決裁スロットの決裁者
    ///
    /// 最初の未決裁スロットが空き（割り当て済みが全員決裁済み）なら `None`。
    pub fn first_pending_name(&self) -> Option<&MemberName> {
        self.0
            .iter()
            .find(|s| !s.has_acted())
            .and_then(|s| s.name.as_ref())
    }

    /// 最も新しく決裁したスロットの決裁者
    pub fn latest_acted_name(&self) -> Option<&MemberName> {
        self.0
            .iter()
            .filter_map(|s| s.acted_at.map(|at| (at, s)))
            .max_by_key(|(at, _)| *at)
            .and_then(|(_, s)| s.name.as_ref())
    }

    /// `name` が割り当てられた最初のスロット（決裁済みかは問わない）
    pub fn position_of(&self, name: &MemberName) -> Option<usize> {
        self.0.iter().position(|s| s.is_assigned_to(name))
    }

    /// `name` が割り当てられた最初の未決裁スロット
    pub fn pending_position_of(&self, name: &MemberName) -> Option<usize> {
        self.0
            .iter()
            .position(|s| s.is_assigned_to(name) && !s.has_acted())
    }

    /// `index` の次のスロットの決裁者
    pub fn assigned_after(&self, index: usize) -> Option<&MemberName> {
        self.0.get(index + 1).and_then(|s| s.name.as_ref())
    }

    /// 割り当て済みスロットがすべて決裁済みか
    pub fn is_exhausted(&self) -> bool {
        self.0
            .iter()
            .filter(|s| s.name.is_some())
            .all(SignerSlot::has_acted)
    }

    /// 決裁者名を連結した文字列（キーワード検索用）
    pub fn joined_names(&self) -> String {
        self.names()
            .map(MemberName::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub(crate) fn record_action(&mut self, index: usize, now: DateTime<Utc>) {
        if let Some(slot) = self.0.get_mut(index) {
            slot.acted_at = Some(now);
        }
    }

    pub(crate) fn set_remark(&mut self, index: usize, remark: Option<String>) {
        if let Some(slot) = self.0.get_mut(index) {
            slot.remark = remark;
        }
    }

    fn is_gap_free(&self) -> bool {
        let mut seen_vacant = false;
        for slot in &self.0 {
            match (&slot.name, seen_vacant) {
                (None, _) => seen_vacant = true,
                (Some(_), true) => return false,
                (Some(_), false) => {}
            }
        }
        true
    }

    fn is_acted_prefix(&self) -> bool {
        self.0
            .iter()
            .skip_while(|s| s.has_acted())
            .all(|s| !s.has_acted())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn name(s: &str) -> MemberName {
        MemberName::new(s).unwrap()
    }

    fn names(list: &[&str]) -> SignerNames {
        let mut out: SignerNames = Default::default();
        for (i, n) in list.iter().enumerate() {
            out[i] = Some(name(n));
        }
        out
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, minute, 0).unwrap()
    }

    #[test]
    fn test_assign_は先頭から詰めた決裁ラインを受け付ける() {
        let chain = SignerChain::assign(names(&["Alice", "Bob"])).unwrap();

        assert_eq!(chain.names().count(), 2);
        assert_eq!(chain.first_pending_name(), Some(&name("Alice")));
        assert!(!chain.has_any_acted());
    }

    #[test]
    fn test_assign_は途中の空きを拒否する() {
        let mut signers = names(&["Alice"]);
        signers[2] = Some(name("Carol"));

        assert!(SignerChain::assign(signers).is_err());
    }

    #[test]
    fn test_from_slots_は決裁日時の飛びを拒否する() {
        let slots = [
            SignerSlot::new(Some(name("Alice")), None, None),
            SignerSlot::new(Some(name("Bob")), Some(at(1)), None),
            SignerSlot::default(),
            SignerSlot::default(),
            SignerSlot::default(),
        ];

        assert!(SignerChain::from_slots(slots).is_err());
    }

    #[test]
    fn test_from_slots_は決裁者なしの決裁日時を拒否する() {
        let slots = [
            SignerSlot::new(None, Some(at(1)), None),
            SignerSlot::default(),
            SignerSlot::default(),
            SignerSlot::default(),
            SignerSlot::default(),
        ];

        assert!(SignerChain::from_slots(slots).is_err());
    }

    #[test]
    fn test_latest_acted_name_は最新の決裁者を返す() {
        let slots = [
            SignerSlot::new(Some(name("Alice")), Some(at(1)), None),
            SignerSlot::new(Some(name("Bob")), Some(at(5)), None),
            SignerSlot::new(Some(name("Carol")), None, None),
            SignerSlot::default(),
            SignerSlot::default(),
        ];
        let chain = SignerChain::from_slots(slots).unwrap();

        assert_eq!(chain.latest_acted_name(), Some(&name("Bob")));
        assert_eq!(chain.first_pending_name(), Some(&name("Carol")));
    }

    #[rstest]
    #[case(&["Alice", "Bob", "Alice"], "Alice", Some(0))]
    #[case(&["Alice", "Bob"], "Bob", Some(1))]
    #[case(&["Alice", "Bob"], "Mallory", None)]
    fn test_position_of_は最初に一致したスロットを返す(
        #[case] list: &[&str],
        #[case] target: &str,
        #[case] expected: Option<usize>,
    ) {
        let chain = SignerChain::assign(names(list)).unwrap();

        assert_eq!(chain.position_of(&name(target)), expected);
    }

    #[test]
    fn test_pending_position_of_は決裁済みスロットを飛ばす() {
        let mut chain = SignerChain::assign(names(&["Alice", "Bob", "Alice"])).unwrap();
        chain.record_action(0, at(1));
        chain.record_action(1, at(2));

        assert_eq!(chain.pending_position_of(&name("Alice")), Some(2));
        assert_eq!(chain.pending_position_of(&name("Bob")), None);
    }

    #[test]
    fn test_is_exhausted_は割り当て済み全員の決裁で真になる() {
        let mut chain = SignerChain::assign(names(&["Alice", "Bob"])).unwrap();
        chain.record_action(0, at(1));
        assert!(!chain.is_exhausted());

        chain.record_action(1, at(2));
        assert!(chain.is_exhausted());
        assert_eq!(chain.first_pending_name(), None);
    }

    #[test]
    fn test_joined_names_は割り当て済みの名前をカンマで連結する() {
        let chain = SignerChain::assign(names(&["Alice", "Bob", "Carol"])).unwrap();

        assert_eq!(chain.joined_names(), "Alice,Bob,Carol");
    }
}
