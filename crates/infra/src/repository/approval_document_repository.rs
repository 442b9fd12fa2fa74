//! # ApprovalDocumentRepository
//!
//! 決裁文書（決裁ライン・状態）の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **決裁ラインの列展開**: 5 つのスロットを `signer_name_n` / `signer_acted_at_n` /
//!   `signer_remark_n` の列グループに展開して保存する
//! - **楽観的ロック**: 更新は `version` 一致を条件にし、0 行更新なら `Conflict`
//! - **復元時の検証**: DB の値は `ApprovalDocument::from_db` で不変条件を検証してから返す

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signflow_domain::{
    approval::{
        ApprovalDocument,
        ApprovalDocumentRecord,
        ApprovalNo,
        ApprovalStatus,
        Drafter,
        MAX_SIGNERS,
        SignerSlot,
    },
    member::MemberId,
    value_objects::{MemberName, ReferenceNames, Version},
};
use sqlx::{
    FromRow,
    PgPool,
    Postgres,
    Row,
    postgres::{PgArguments, PgRow},
    query::Query,
};
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

const SELECT_COLUMNS: &str = r#"
    SELECT
        approval_no, drafter_id, drafter_name, drafter_department, drafter_position,
        signer_name_1, signer_acted_at_1, signer_remark_1,
        signer_name_2, signer_acted_at_2, signer_remark_2,
        signer_name_3, signer_acted_at_3, signer_remark_3,
        signer_name_4, signer_acted_at_4, signer_remark_4,
        signer_name_5, signer_acted_at_5, signer_remark_5,
        next_signer, reference_names, status, started_at, ended_at,
        version, created_at, updated_at, updated_by
    FROM approval_documents
"#;

/// 決裁文書リポジトリトレイト
#[async_trait]
pub trait ApprovalDocumentRepository: Send + Sync {
    /// 新規作成
    async fn insert(&self, tx: &mut TxContext, document: &ApprovalDocument)
    -> Result<(), InfraError>;

    /// バージョンを確認して更新する
    ///
    /// `expected_version` は読み込み時点のバージョン。一致しなければ `Conflict`。
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        document: &ApprovalDocument,
        expected_version: Version,
    ) -> Result<(), InfraError>;

    async fn find_by_no(&self, approval_no: &ApprovalNo)
    -> Result<Option<ApprovalDocument>, InfraError>;

    /// 起案者・決裁者・参照者のいずれかとして関わる文書（登録日の新しい順）
    ///
    /// 決裁済みかどうかや下書きかどうかは問わない。表示可否は呼び出し側で判定する。
    async fn find_related(
        &self,
        member_id: &MemberId,
        name: &MemberName,
    ) -> Result<Vec<ApprovalDocument>, InfraError>;

    /// 起案者本人の文書（登録日の新しい順）
    async fn find_by_drafter(&self, member_id: &MemberId)
    -> Result<Vec<ApprovalDocument>, InfraError>;

    /// 次の決裁者が `name` になっている決裁中の文書（登録日の新しい順）
    async fn find_pending_for(&self, name: &MemberName)
    -> Result<Vec<ApprovalDocument>, InfraError>;

    /// 削除する（本文は外部キーの ON DELETE CASCADE で削除される）
    async fn delete(&self, tx: &mut TxContext, approval_no: &ApprovalNo)
    -> Result<(), InfraError>;
}

/// PostgreSQL 実装の ApprovalDocumentRepository
#[derive(Debug, Clone)]
pub struct PostgresApprovalDocumentRepository {
    pool: PgPool,
}

impl PostgresApprovalDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// approval_documents の 1 行
struct ApprovalDocumentRow {
    approval_no:        Uuid,
    drafter_id:         String,
    drafter_name:       String,
    drafter_department: String,
    drafter_position:   String,
    signers:            Vec<(Option<String>, Option<DateTime<Utc>>, Option<String>)>,
    next_signer:        Option<String>,
    reference_names:    String,
    status:             String,
    started_at:         Option<DateTime<Utc>>,
    ended_at:           Option<DateTime<Utc>>,
    version:            i32,
    created_at:         DateTime<Utc>,
    updated_at:         DateTime<Utc>,
    updated_by:         String,
}

impl<'r> FromRow<'r, PgRow> for ApprovalDocumentRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let signers = (1..=MAX_SIGNERS)
            .map(|n| {
                Ok((
                    row.try_get(format!("signer_name_{n}").as_str())?,
                    row.try_get(format!("signer_acted_at_{n}").as_str())?,
                    row.try_get(format!("signer_remark_{n}").as_str())?,
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Self {
            approval_no: row.try_get("approval_no")?,
            drafter_id: row.try_get("drafter_id")?,
            drafter_name: row.try_get("drafter_name")?,
            drafter_department: row.try_get("drafter_department")?,
            drafter_position: row.try_get("drafter_position")?,
            signers,
            next_signer: row.try_get("next_signer")?,
            reference_names: row.try_get("reference_names")?,
            status: row.try_get("status")?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            updated_by: row.try_get("updated_by")?,
        })
    }
}

fn unexpected(context: &str) -> impl FnOnce(signflow_domain::DomainError) -> InfraError + '_ {
    move |e| InfraError::unexpected(format!("{context}: {e}"))
}

impl TryFrom<ApprovalDocumentRow> for ApprovalDocument {
    type Error = InfraError;

    fn try_from(row: ApprovalDocumentRow) -> Result<Self, Self::Error> {
        let mut slots: [SignerSlot; MAX_SIGNERS] = Default::default();
        for (slot, (name, acted_at, remark)) in slots.iter_mut().zip(row.signers) {
            let name = MemberName::new_optional(name).map_err(unexpected("決裁者名"))?;
            *slot = SignerSlot::new(name, acted_at, remark);
        }

        let record = ApprovalDocumentRecord {
            approval_no: ApprovalNo::from_uuid(row.approval_no),
            drafter: Drafter {
                id:         MemberId::new(row.drafter_id).map_err(unexpected("起案者 ID"))?,
                name:       MemberName::new(row.drafter_name).map_err(unexpected("起案者名"))?,
                department: row.drafter_department,
                position:   row.drafter_position,
            },
            signers: slots,
            references: ReferenceNames::parse(&row.reference_names)
                .map_err(unexpected("参照者"))?,
            status: row
                .status
                .parse::<ApprovalStatus>()
                .map_err(unexpected("ステータス"))?,
            next_signer: MemberName::new_optional(row.next_signer)
                .map_err(unexpected("次の決裁者"))?,
            started_at: row.started_at,
            ended_at: row.ended_at,
            version: Version::try_from(row.version).map_err(unexpected("バージョン"))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            updated_by: MemberId::new(row.updated_by).map_err(unexpected("更新者"))?,
        };

        ApprovalDocument::from_db(record).map_err(unexpected("決裁文書の復元"))
    }
}

/// `SELECT_COLUMNS` と同じ列順で値をバインドする（$1〜$29）
fn bind_document<'q>(
    query: Query<'q, Postgres, PgArguments>,
    document: &'q ApprovalDocument,
) -> Query<'q, Postgres, PgArguments> {
    let drafter = document.drafter();
    let mut query = query
        .bind(document.approval_no().as_uuid())
        .bind(drafter.id.as_str())
        .bind(drafter.name.as_str())
        .bind(drafter.department.as_str())
        .bind(drafter.position.as_str());
    for slot in document.signers().slots() {
        query = query
            .bind(slot.name().map(MemberName::as_str))
            .bind(slot.acted_at())
            .bind(slot.remark());
    }
    query
        .bind(document.next_signer().map(MemberName::as_str))
        .bind(document.references().to_joined())
        .bind(document.status().as_str())
        .bind(document.started_at())
        .bind(document.ended_at())
        .bind(document.version().as_i32())
        .bind(document.created_at())
        .bind(document.updated_at())
        .bind(document.updated_by().as_str())
}

fn into_documents(rows: Vec<ApprovalDocumentRow>) -> Result<Vec<ApprovalDocument>, InfraError> {
    rows.into_iter().map(ApprovalDocument::try_from).collect()
}

#[async_trait]
impl ApprovalDocumentRepository for PostgresApprovalDocumentRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(approval_no = %document.approval_no()))]
    async fn insert(
        &self,
        tx: &mut TxContext,
        document: &ApprovalDocument,
    ) -> Result<(), InfraError> {
        let query = sqlx::query(
            r#"
            INSERT INTO approval_documents (
                approval_no, drafter_id, drafter_name, drafter_department, drafter_position,
                signer_name_1, signer_acted_at_1, signer_remark_1,
                signer_name_2, signer_acted_at_2, signer_remark_2,
                signer_name_3, signer_acted_at_3, signer_remark_3,
                signer_name_4, signer_acted_at_4, signer_remark_4,
                signer_name_5, signer_acted_at_5, signer_remark_5,
                next_signer, reference_names, status, started_at, ended_at,
                version, created_at, updated_at, updated_by
            )
            VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
                $21, $22, $23, $24, $25, $26, $27, $28, $29
            )
            "#,
        );
        bind_document(query, document).execute(tx.conn()).await?;

        Ok(())
    }

    #[tracing::instrument(
        skip_all,
        level = "debug",
        fields(approval_no = %document.approval_no(), %expected_version)
    )]
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        document: &ApprovalDocument,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let query = sqlx::query(
            r#"
            UPDATE approval_documents SET
                drafter_id = $2, drafter_name = $3, drafter_department = $4, drafter_position = $5,
                signer_name_1 = $6, signer_acted_at_1 = $7, signer_remark_1 = $8,
                signer_name_2 = $9, signer_acted_at_2 = $10, signer_remark_2 = $11,
                signer_name_3 = $12, signer_acted_at_3 = $13, signer_remark_3 = $14,
                signer_name_4 = $15, signer_acted_at_4 = $16, signer_remark_4 = $17,
                signer_name_5 = $18, signer_acted_at_5 = $19, signer_remark_5 = $20,
                next_signer = $21, reference_names = $22, status = $23,
                started_at = $24, ended_at = $25, version = $26,
                created_at = $27, updated_at = $28, updated_by = $29
            WHERE approval_no = $1 AND version = $30
            "#,
        );
        let result = bind_document(query, document)
            .bind(expected_version.as_i32())
            .execute(tx.conn())
            .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict(
                "ApprovalDocument",
                document.approval_no().to_string(),
            ));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%approval_no))]
    async fn find_by_no(
        &self,
        approval_no: &ApprovalNo,
    ) -> Result<Option<ApprovalDocument>, InfraError> {
        let sql = format!("{SELECT_COLUMNS} WHERE approval_no = $1");
        let row = sqlx::query_as::<_, ApprovalDocumentRow>(&sql)
            .bind(approval_no.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(ApprovalDocument::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%member_id))]
    async fn find_related(
        &self,
        member_id: &MemberId,
        name: &MemberName,
    ) -> Result<Vec<ApprovalDocument>, InfraError> {
        let sql = format!(
            r#"{SELECT_COLUMNS}
            WHERE drafter_id = $1
               OR $2 IN (signer_name_1, signer_name_2, signer_name_3, signer_name_4, signer_name_5)
               OR $2 = ANY(string_to_array(reference_names, ','))
            ORDER BY created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, ApprovalDocumentRow>(&sql)
            .bind(member_id.as_str())
            .bind(name.as_str())
            .fetch_all(&self.pool)
            .await?;

        into_documents(rows)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%member_id))]
    async fn find_by_drafter(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<ApprovalDocument>, InfraError> {
        let sql = format!("{SELECT_COLUMNS} WHERE drafter_id = $1 ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, ApprovalDocumentRow>(&sql)
            .bind(member_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        into_documents(rows)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%name))]
    async fn find_pending_for(
        &self,
        name: &MemberName,
    ) -> Result<Vec<ApprovalDocument>, InfraError> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE status = 'in_progress' AND next_signer = $1 \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ApprovalDocumentRow>(&sql)
            .bind(name.as_str())
            .fetch_all(&self.pool)
            .await?;

        into_documents(rows)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%approval_no))]
    async fn delete(&self, tx: &mut TxContext, approval_no: &ApprovalNo) -> Result<(), InfraError> {
        sqlx::query("DELETE FROM approval_documents WHERE approval_no = $1")
            .bind(approval_no.as_uuid())
            .execute(tx.conn())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn ApprovalDocumentRepository>>();
    }
}
