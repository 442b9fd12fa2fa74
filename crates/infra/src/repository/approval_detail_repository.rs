//! # ApprovalDetailRepository
//!
//! 決裁文書の本文・添付スロット・コメント欄の永続化を担当するリポジトリ。
//!
//! 添付スロットは `(path, name, info)` の列グループで保存し、
//! `path` と `name` がそろっている場合だけ添付ありとして復元する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signflow_domain::{
    approval::{
        ApprovalDetail,
        ApprovalDetailRecord,
        ApprovalNo,
        Attachment,
        FormNo,
        MAX_DRAFTER_ATTACHMENTS,
    },
    member::MemberId,
    value_objects::{FormType, Version},
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
        approval_no, form_no, form_type, title, body,
        drafter_attachment_path_1, drafter_attachment_name_1, drafter_attachment_info_1,
        drafter_attachment_path_2, drafter_attachment_name_2, drafter_attachment_info_2,
        drafter_attachment_path_3, drafter_attachment_name_3, drafter_attachment_info_3,
        drafter_attachment_path_4, drafter_attachment_name_4, drafter_attachment_info_4,
        drafter_attachment_path_5, drafter_attachment_name_5, drafter_attachment_info_5,
        signer_attachment_path, signer_attachment_name, signer_attachment_info,
        referencer_attachment_path, referencer_attachment_name, referencer_attachment_info,
        drafter_remark, reference_remark,
        version, created_at, updated_at, updated_by
    FROM approval_details
"#;

/// 決裁文書本文リポジトリトレイト
#[async_trait]
pub trait ApprovalDetailRepository: Send + Sync {
    async fn insert(&self, tx: &mut TxContext, detail: &ApprovalDetail) -> Result<(), InfraError>;

    /// バージョンを確認して更新する
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        detail: &ApprovalDetail,
        expected_version: Version,
    ) -> Result<(), InfraError>;

    async fn find_by_no(&self, approval_no: &ApprovalNo)
    -> Result<Option<ApprovalDetail>, InfraError>;

    /// 複数の文書番号で一括取得する（順序は保証しない）
    async fn find_by_nos(&self, approval_nos: &[ApprovalNo])
    -> Result<Vec<ApprovalDetail>, InfraError>;

    async fn delete(&self, tx: &mut TxContext, approval_no: &ApprovalNo)
    -> Result<(), InfraError>;
}

/// PostgreSQL 実装の ApprovalDetailRepository
#[derive(Debug, Clone)]
pub struct PostgresApprovalDetailRepository {
    pool: PgPool,
}

impl PostgresApprovalDetailRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type AttachmentColumns = (Option<String>, Option<String>, Option<String>);

struct ApprovalDetailRow {
    approval_no:           Uuid,
    form_no:               Uuid,
    form_type:             String,
    title:                 String,
    body:                  String,
    drafter_attachments:   Vec<AttachmentColumns>,
    signer_attachment:     AttachmentColumns,
    referencer_attachment: AttachmentColumns,
    drafter_remark:        Option<String>,
    reference_remark:      Option<String>,
    version:               i32,
    created_at:            DateTime<Utc>,
    updated_at:            DateTime<Utc>,
    updated_by:            String,
}

fn attachment_columns(row: &PgRow, prefix: &str) -> Result<AttachmentColumns, sqlx::Error> {
    Ok((
        row.try_get(format!("{prefix}_path").as_str())?,
        row.try_get(format!("{prefix}_name").as_str())?,
        row.try_get(format!("{prefix}_info").as_str())?,
    ))
}

impl<'r> FromRow<'r, PgRow> for ApprovalDetailRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let drafter_attachments = (1..=MAX_DRAFTER_ATTACHMENTS)
            .map(|n| {
                Ok((
                    row.try_get(format!("drafter_attachment_path_{n}").as_str())?,
                    row.try_get(format!("drafter_attachment_name_{n}").as_str())?,
                    row.try_get(format!("drafter_attachment_info_{n}").as_str())?,
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Self {
            approval_no: row.try_get("approval_no")?,
            form_no: row.try_get("form_no")?,
            form_type: row.try_get("form_type")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            drafter_attachments,
            signer_attachment: attachment_columns(row, "signer_attachment")?,
            referencer_attachment: attachment_columns(row, "referencer_attachment")?,
            drafter_remark: row.try_get("drafter_remark")?,
            reference_remark: row.try_get("reference_remark")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            updated_by: row.try_get("updated_by")?,
        })
    }
}

fn to_attachment((path, file_name, info): AttachmentColumns) -> Option<Attachment> {
    match (path, file_name) {
        (Some(path), Some(file_name)) => Some(Attachment {
            path,
            file_name,
            info: info.unwrap_or_default(),
        }),
        _ => None,
    }
}

impl TryFrom<ApprovalDetailRow> for ApprovalDetail {
    type Error = InfraError;

    fn try_from(row: ApprovalDetailRow) -> Result<Self, Self::Error> {
        let mut drafter_attachments: [Option<Attachment>; MAX_DRAFTER_ATTACHMENTS] =
            Default::default();
        for (slot, columns) in drafter_attachments.iter_mut().zip(row.drafter_attachments) {
            *slot = to_attachment(columns);
        }

        Ok(ApprovalDetail::from_db(ApprovalDetailRecord {
            approval_no: ApprovalNo::from_uuid(row.approval_no),
            form_no: FormNo::from_uuid(row.form_no),
            form_type: FormType::new(row.form_type)
                .map_err(|e| InfraError::unexpected(format!("様式種別: {e}")))?,
            title: row.title,
            body: row.body,
            drafter_attachments,
            signer_attachment: to_attachment(row.signer_attachment),
            referencer_attachment: to_attachment(row.referencer_attachment),
            drafter_remark: row.drafter_remark,
            reference_remark: row.reference_remark,
            version: Version::try_from(row.version)
                .map_err(|e| InfraError::unexpected(format!("バージョン: {e}")))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            updated_by: MemberId::new(row.updated_by)
                .map_err(|e| InfraError::unexpected(format!("更新者: {e}")))?,
        }))
    }
}

fn bind_attachment<'q>(
    query: Query<'q, Postgres, PgArguments>,
    attachment: Option<&'q Attachment>,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(attachment.map(|a| a.path.as_str()))
        .bind(attachment.map(|a| a.file_name.as_str()))
        .bind(attachment.map(|a| a.info.as_str()))
}

/// `SELECT_COLUMNS` と同じ列順で値をバインドする（$1〜$32）
fn bind_detail<'q>(
    query: Query<'q, Postgres, PgArguments>,
    detail: &'q ApprovalDetail,
) -> Query<'q, Postgres, PgArguments> {
    let mut query = query
        .bind(detail.approval_no().as_uuid())
        .bind(detail.form_no().as_uuid())
        .bind(detail.form_type().as_str())
        .bind(detail.title())
        .bind(detail.body());
    for attachment in detail.drafter_attachments() {
        query = bind_attachment(query, attachment.as_ref());
    }
    query = bind_attachment(query, detail.signer_attachment());
    query = bind_attachment(query, detail.referencer_attachment());
    query
        .bind(detail.drafter_remark())
        .bind(detail.reference_remark())
        .bind(detail.version().as_i32())
        .bind(detail.created_at())
        .bind(detail.updated_at())
        .bind(detail.updated_by().as_str())
}

#[async_trait]
impl ApprovalDetailRepository for PostgresApprovalDetailRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(approval_no = %detail.approval_no()))]
    async fn insert(&self, tx: &mut TxContext, detail: &ApprovalDetail) -> Result<(), InfraError> {
        let query = sqlx::query(
            r#"
            INSERT INTO approval_details (
                approval_no, form_no, form_type, title, body,
                drafter_attachment_path_1, drafter_attachment_name_1, drafter_attachment_info_1,
                drafter_attachment_path_2, drafter_attachment_name_2, drafter_attachment_info_2,
                drafter_attachment_path_3, drafter_attachment_name_3, drafter_attachment_info_3,
                drafter_attachment_path_4, drafter_attachment_name_4, drafter_attachment_info_4,
                drafter_attachment_path_5, drafter_attachment_name_5, drafter_attachment_info_5,
                signer_attachment_path, signer_attachment_name, signer_attachment_info,
                referencer_attachment_path, referencer_attachment_name, referencer_attachment_info,
                drafter_remark, reference_remark,
                version, created_at, updated_at, updated_by
            )
            VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
                $21, $22, $23, $24, $25, $26,
                $27, $28, $29, $30, $31, $32
            )
            "#,
        );
        bind_detail(query, detail).execute(tx.conn()).await?;

        Ok(())
    }

    #[tracing::instrument(
        skip_all,
        level = "debug",
        fields(approval_no = %detail.approval_no(), %expected_version)
    )]
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        detail: &ApprovalDetail,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let query = sqlx::query(
            r#"
            UPDATE approval_details SET
                form_no = $2, form_type = $3, title = $4, body = $5,
                drafter_attachment_path_1 = $6, drafter_attachment_name_1 = $7,
                drafter_attachment_info_1 = $8,
                drafter_attachment_path_2 = $9, drafter_attachment_name_2 = $10,
                drafter_attachment_info_2 = $11,
                drafter_attachment_path_3 = $12, drafter_attachment_name_3 = $13,
                drafter_attachment_info_3 = $14,
                drafter_attachment_path_4 = $15, drafter_attachment_name_4 = $16,
                drafter_attachment_info_4 = $17,
                drafter_attachment_path_5 = $18, drafter_attachment_name_5 = $19,
                drafter_attachment_info_5 = $20,
                signer_attachment_path = $21, signer_attachment_name = $22,
                signer_attachment_info = $23,
                referencer_attachment_path = $24, referencer_attachment_name = $25,
                referencer_attachment_info = $26,
                drafter_remark = $27, reference_remark = $28,
                version = $29, created_at = $30, updated_at = $31, updated_by = $32
            WHERE approval_no = $1 AND version = $33
            "#,
        );
        let result = bind_detail(query, detail)
            .bind(expected_version.as_i32())
            .execute(tx.conn())
            .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict(
                "ApprovalDetail",
                detail.approval_no().to_string(),
            ));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%approval_no))]
    async fn find_by_no(
        &self,
        approval_no: &ApprovalNo,
    ) -> Result<Option<ApprovalDetail>, InfraError> {
        let sql = format!("{SELECT_COLUMNS} WHERE approval_no = $1");
        let row = sqlx::query_as::<_, ApprovalDetailRow>(&sql)
            .bind(approval_no.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(ApprovalDetail::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(count = approval_nos.len()))]
    async fn find_by_nos(
        &self,
        approval_nos: &[ApprovalNo],
    ) -> Result<Vec<ApprovalDetail>, InfraError> {
        if approval_nos.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = approval_nos.iter().map(|no| *no.as_uuid()).collect();
        let sql = format!("{SELECT_COLUMNS} WHERE approval_no = ANY($1)");
        let rows = sqlx::query_as::<_, ApprovalDetailRow>(&sql)
            .bind(uuids)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ApprovalDetail::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%approval_no))]
    async fn delete(&self, tx: &mut TxContext, approval_no: &ApprovalNo) -> Result<(), InfraError> {
        sqlx::query("DELETE FROM approval_details WHERE approval_no = $1")
            .bind(approval_no.as_uuid())
            .execute(tx.conn())
            .await?;

        Ok(())
    }
}
