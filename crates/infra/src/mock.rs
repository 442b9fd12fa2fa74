//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモックリポジトリとストレージ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! signflow-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::BTreeMap,
    io,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use signflow_domain::{
    approval::{
        ApprovalDetail,
        ApprovalDocument,
        ApprovalForm,
        ApprovalNo,
        ApprovalStatus,
        FormNo,
    },
    member::{Member, MemberId},
    value_objects::{MemberName, Version},
};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    repository::{
        ApprovalDetailRepository,
        ApprovalDocumentRepository,
        ApprovalFormRepository,
        MemberRepository,
    },
    storage::{FileStorage, StorageArea, StoredFile, sanitize_file_name},
};

fn newest_first(mut documents: Vec<ApprovalDocument>) -> Vec<ApprovalDocument> {
    documents.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    documents
}

// ===== MockTransactionManager =====

/// テスト用のモック TransactionManager
///
/// 常に `TxContext::mock()` を返す。
#[derive(Clone, Copy, Default)]
pub struct MockTransactionManager;

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::mock())
    }
}

// ===== MockApprovalDocumentRepository =====

#[derive(Clone, Default)]
pub struct MockApprovalDocumentRepository {
    documents:   Arc<Mutex<Vec<ApprovalDocument>>>,
    /// 次の更新の直前に割り込んでコミットされる文書
    interleaved: Arc<Mutex<Option<ApprovalDocument>>>,
}

impl MockApprovalDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&self, document: ApprovalDocument) {
        self.documents.lock().unwrap().push(document);
    }

    /// 次の `update_with_version_check` の直前に、別トランザクションが
    /// `document` をコミットしたものとして扱う
    pub fn commit_before_next_update(&self, document: ApprovalDocument) {
        *self.interleaved.lock().unwrap() = Some(document);
    }

    /// 保存済みの文書を直接参照する（テストの検証用）
    pub fn get(&self, approval_no: &ApprovalNo) -> Option<ApprovalDocument> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.approval_no() == approval_no)
            .cloned()
    }
}

#[async_trait]
impl ApprovalDocumentRepository for MockApprovalDocumentRepository {
    async fn insert(
        &self,
        _tx: &mut TxContext,
        document: &ApprovalDocument,
    ) -> Result<(), InfraError> {
        self.documents.lock().unwrap().push(document.clone());
        Ok(())
    }

    async fn update_with_version_check(
        &self,
        _tx: &mut TxContext,
        document: &ApprovalDocument,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let mut documents = self.documents.lock().unwrap();
        if let Some(other) = self.interleaved.lock().unwrap().take()
            && let Some(stored) = documents
                .iter_mut()
                .find(|d| d.approval_no() == other.approval_no())
        {
            *stored = other;
        }
        let stored = documents
            .iter_mut()
            .find(|d| d.approval_no() == document.approval_no() && d.version() == expected_version)
            .ok_or_else(|| {
                InfraError::conflict("ApprovalDocument", document.approval_no().to_string())
            })?;
        *stored = document.clone();
        Ok(())
    }

    async fn find_by_no(
        &self,
        approval_no: &ApprovalNo,
    ) -> Result<Option<ApprovalDocument>, InfraError> {
        Ok(self.get(approval_no))
    }

    async fn find_related(
        &self,
        member_id: &MemberId,
        name: &MemberName,
    ) -> Result<Vec<ApprovalDocument>, InfraError> {
        let related = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.is_drafted_by(member_id)
                    || d.signers().position_of(name).is_some()
                    || d.references().contains(name)
            })
            .cloned()
            .collect();
        Ok(newest_first(related))
    }

    async fn find_by_drafter(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<ApprovalDocument>, InfraError> {
        let drafted = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.is_drafted_by(member_id))
            .cloned()
            .collect();
        Ok(newest_first(drafted))
    }

    async fn find_pending_for(
        &self,
        name: &MemberName,
    ) -> Result<Vec<ApprovalDocument>, InfraError> {
        let pending = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.status() == ApprovalStatus::InProgress && d.next_signer() == Some(name))
            .cloned()
            .collect();
        Ok(newest_first(pending))
    }

    async fn delete(&self, _tx: &mut TxContext, approval_no: &ApprovalNo) -> Result<(), InfraError> {
        self.documents
            .lock()
            .unwrap()
            .retain(|d| d.approval_no() != approval_no);
        Ok(())
    }
}

// ===== MockApprovalDetailRepository =====

#[derive(Clone, Default)]
pub struct MockApprovalDetailRepository {
    details: Arc<Mutex<Vec<ApprovalDetail>>>,
}

impl MockApprovalDetailRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_detail(&self, detail: ApprovalDetail) {
        self.details.lock().unwrap().push(detail);
    }

    /// 保存済みの本文を直接参照する（テストの検証用）
    pub fn get(&self, approval_no: &ApprovalNo) -> Option<ApprovalDetail> {
        self.details
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.approval_no() == approval_no)
            .cloned()
    }
}

#[async_trait]
impl ApprovalDetailRepository for MockApprovalDetailRepository {
    async fn insert(&self, _tx: &mut TxContext, detail: &ApprovalDetail) -> Result<(), InfraError> {
        self.details.lock().unwrap().push(detail.clone());
        Ok(())
    }

    async fn update_with_version_check(
        &self,
        _tx: &mut TxContext,
        detail: &ApprovalDetail,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let mut details = self.details.lock().unwrap();
        let stored = details
            .iter_mut()
            .find(|d| d.approval_no() == detail.approval_no() && d.version() == expected_version)
            .ok_or_else(|| {
                InfraError::conflict("ApprovalDetail", detail.approval_no().to_string())
            })?;
        *stored = detail.clone();
        Ok(())
    }

    async fn find_by_no(
        &self,
        approval_no: &ApprovalNo,
    ) -> Result<Option<ApprovalDetail>, InfraError> {
        Ok(self.get(approval_no))
    }

    async fn find_by_nos(
        &self,
        approval_nos: &[ApprovalNo],
    ) -> Result<Vec<ApprovalDetail>, InfraError> {
        Ok(self
            .details
            .lock()
            .unwrap()
            .iter()
            .filter(|d| approval_nos.contains(d.approval_no()))
            .cloned()
            .collect())
    }

    async fn delete(&self, _tx: &mut TxContext, approval_no: &ApprovalNo) -> Result<(), InfraError> {
        self.details
            .lock()
            .unwrap()
            .retain(|d| d.approval_no() != approval_no);
        Ok(())
    }
}

// ===== MockApprovalFormRepository =====

#[derive(Clone, Default)]
pub struct MockApprovalFormRepository {
    forms: Arc<Mutex<Vec<ApprovalForm>>>,
}

impl MockApprovalFormRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_form(&self, form: ApprovalForm) {
        self.forms.lock().unwrap().push(form);
    }
}

#[async_trait]
impl ApprovalFormRepository for MockApprovalFormRepository {
    async fn find_all(&self) -> Result<Vec<ApprovalForm>, InfraError> {
        let mut forms = self.forms.lock().unwrap().clone();
        forms.sort_by(|a, b| a.title().cmp(b.title()));
        Ok(forms)
    }

    async fn find_by_no(&self, form_no: &FormNo) -> Result<Option<ApprovalForm>, InfraError> {
        Ok(self
            .forms
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.form_no() == form_no)
            .cloned())
    }

    async fn insert(&self, _tx: &mut TxContext, form: &ApprovalForm) -> Result<(), InfraError> {
        self.forms.lock().unwrap().push(form.clone());
        Ok(())
    }

    async fn delete(&self, _tx: &mut TxContext, form_no: &FormNo) -> Result<bool, InfraError> {
        let mut forms = self.forms.lock().unwrap();
        let before = forms.len();
        forms.retain(|f| f.form_no() != form_no);
        Ok(forms.len() < before)
    }
}

// ===== MockMemberRepository =====

#[derive(Clone, Default)]
pub struct MockMemberRepository {
    members: Arc<Mutex<Vec<Member>>>,
}

impl MockMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, member: Member) {
        self.members.lock().unwrap().push(member);
    }
}

#[async_trait]
impl MemberRepository for MockMemberRepository {
    async fn find_by_id(&self, id: &MemberId) -> Result<Option<Member>, InfraError> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .find(|m| &m.id == id)
            .cloned())
    }

    async fn find_by_name(&self, name: &MemberName) -> Result<Option<Member>, InfraError> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .find(|m| &m.name == name)
            .cloned())
    }
}

// ===== MockFileStorage =====

/// テスト用のインメモリ FileStorage
///
/// パスは `upload/{millis}_{name}` または `temp/{millis}_{name}` の形式になる。
#[derive(Clone, Default)]
pub struct MockFileStorage {
    files:         Arc<Mutex<BTreeMap<String, Bytes>>>,
    fail_on_store: Arc<Mutex<Option<String>>>,
}

impl MockFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みファイルのパス一覧（昇順）
    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn put(&self, path: impl Into<String>, content: Bytes) {
        self.files.lock().unwrap().insert(path.into(), content);
    }

    /// 指定した元ファイル名の保存を I/O エラーにする
    pub fn fail_on_store(&self, original_name: impl Into<String>) {
        *self.fail_on_store.lock().unwrap() = Some(original_name.into());
    }
}

#[async_trait]
impl FileStorage for MockFileStorage {
    async fn store(
        &self,
        area: StorageArea,
        original_name: &str,
        content: Bytes,
        now: DateTime<Utc>,
    ) -> Result<StoredFile, InfraError> {
        let name = sanitize_file_name(original_name)?;
        if self.fail_on_store.lock().unwrap().as_deref() == Some(name) {
            return Err(InfraError::storage(io::Error::other("disk full")));
        }
        let dir = match area {
            StorageArea::Upload => "upload",
            StorageArea::Temporary => "temp",
        };
        let mut files = self.files.lock().unwrap();
        let mut millis = now.timestamp_millis();
        loop {
            let file_name = format!("{millis}_{name}");
            let path = format!("{dir}/{file_name}");
            if !files.contains_key(&path) {
                files.insert(path.clone(), content);
                return Ok(StoredFile { path, file_name });
            }
            millis += 1;
        }
    }

    async fn load(&self, path: &str) -> Result<Bytes, InfraError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| InfraError::storage(io::Error::from(io::ErrorKind::NotFound)))
    }

    async fn delete(&self, path: &str) -> Result<(), InfraError> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    async fn ensure_ready(&self) -> Result<(), InfraError> {
        Ok(())
    }
}
