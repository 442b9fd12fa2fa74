//! # ApprovalFormRepository
//!
//! 決裁様式の永続化を担当するリポジトリ。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signflow_domain::{
    approval::{ApprovalForm, ApprovalFormRecord, FormNo, MAX_SIGNERS, SignerNames},
    value_objects::{FormType, MemberName, ReferenceNames},
};
use sqlx::{FromRow, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

const SELECT_COLUMNS: &str = r#"
    SELECT
        form_no, form_type, title, template,
        signer_name_1, signer_name_2, signer_name_3, signer_name_4, signer_name_5,
        reference_names, created_at
    FROM approval_forms
"#;

/// 決裁様式リポジトリトレイト
#[async_trait]
pub trait ApprovalFormRepository: Send + Sync {
    /// 全様式を様式名の昇順で取得する
    async fn find_all(&self) -> Result<Vec<ApprovalForm>, InfraError>;

    async fn find_by_no(&self, form_no: &FormNo) -> Result<Option<ApprovalForm>, InfraError>;

    async fn insert(&self, tx: &mut TxContext, form: &ApprovalForm) -> Result<(), InfraError>;

    /// 様式を削除する
    ///
    /// 削除対象が存在しなかった場合は `false` を返す。
    async fn delete(&self, tx: &mut TxContext, form_no: &FormNo) -> Result<bool, InfraError>;
}

/// PostgreSQL 実装の ApprovalFormRepository
#[derive(Debug, Clone)]
pub struct PostgresApprovalFormRepository {
    pool: PgPool,
}

impl PostgresApprovalFormRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct ApprovalFormRow {
    form_no:         Uuid,
    form_type:       String,
    title:           String,
    template:        String,
    signer_names:    Vec<Option<String>>,
    reference_names: String,
    created_at:      DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ApprovalFormRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let signer_names = (1..=MAX_SIGNERS)
            .map(|n| row.try_get(format!("signer_name_{n}").as_str()))
            .collect::<Result<Vec<Option<String>>, sqlx::Error>>()?;

        Ok(Self {
            form_no: row.try_get("form_no")?,
            form_type: row.try_get("form_type")?,
            title: row.try_get("title")?,
            template: row.try_get("template")?,
            signer_names,
            reference_names: row.try_get("reference_names")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<ApprovalFormRow> for ApprovalForm {
    type Error = InfraError;

    fn try_from(row: ApprovalFormRow) -> Result<Self, Self::Error> {
        let mut signers: SignerNames = Default::default();
        for (slot, name) in signers.iter_mut().zip(row.signer_names) {
            *slot = MemberName::new_optional(name)
                .map_err(|e| InfraError::unexpected(format!("様式の決裁者: {e}")))?;
        }

        Ok(ApprovalForm::from_db(ApprovalFormRecord {
            form_no: FormNo::from_uuid(row.form_no),
            form_type: FormType::new(row.form_type)
                .map_err(|e| InfraError::unexpected(format!("様式種別: {e}")))?,
            title: row.title,
            template: row.template,
            signers,
            references: ReferenceNames::parse(&row.reference_names)
                .map_err(|e| InfraError::unexpected(format!("様式の参照者: {e}")))?,
            created_at: row.created_at,
        }))
    }
}

#[async_trait]
impl ApprovalFormRepository for PostgresApprovalFormRepository {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<ApprovalForm>, InfraError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY title ASC");
        let rows = sqlx::query_as::<_, ApprovalFormRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ApprovalForm::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%form_no))]
    async fn find_by_no(&self, form_no: &FormNo) -> Result<Option<ApprovalForm>, InfraError> {
        let sql = format!("{SELECT_COLUMNS} WHERE form_no = $1");
        let row = sqlx::query_as::<_, ApprovalFormRow>(&sql)
            .bind(form_no.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(ApprovalForm::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(form_no = %form.form_no()))]
    async fn insert(&self, tx: &mut TxContext, form: &ApprovalForm) -> Result<(), InfraError> {
        let mut query = sqlx::query(
            r#"
            INSERT INTO approval_forms (
                form_no, form_type, title, template,
                signer_name_1, signer_name_2, signer_name_3, signer_name_4, signer_name_5,
                reference_names, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(form.form_no().as_uuid())
        .bind(form.form_type().as_str())
        .bind(form.title())
        .bind(form.template());
        for name in form.signers() {
            query = query.bind(name.as_ref().map(MemberName::as_str));
        }
        query
            .bind(form.references().to_joined())
            .bind(form.created_at())
            .execute(tx.conn())
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%form_no))]
    async fn delete(&self, tx: &mut TxContext, form_no: &FormNo) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM approval_forms WHERE form_no = $1")
            .bind(form_no.as_uuid())
            .execute(tx.conn())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
