//! # MemberRepository
//!
//! メンバーの参照を担当するリポジトリ。
//! メンバーの登録・更新は行わない。

use async_trait::async_trait;
use signflow_domain::{
    member::{Member, MemberId},
    value_objects::MemberName,
};
use sqlx::{FromRow, PgPool};

use crate::error::InfraError;

/// メンバーリポジトリトレイト
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_by_id(&self, id: &MemberId) -> Result<Option<Member>, InfraError>;

    /// 表示名で検索する（決裁ラインはメンバー名で指定されるため）
    async fn find_by_name(&self, name: &MemberName) -> Result<Option<Member>, InfraError>;
}

/// PostgreSQL 実装の MemberRepository
#[derive(Debug, Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct MemberRow {
    id:         String,
    name:       String,
    department: String,
    position:   String,
}

impl TryFrom<MemberRow> for Member {
    type Error = InfraError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        Ok(Member {
            id:         MemberId::new(row.id)
                .map_err(|e| InfraError::unexpected(format!("メンバー ID: {e}")))?,
            name:       MemberName::new(row.name)
                .map_err(|e| InfraError::unexpected(format!("メンバー名: {e}")))?,
            department: row.department,
            position:   row.position,
        })
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &MemberId) -> Result<Option<Member>, InfraError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT id, name, department, position FROM members WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Member::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%name))]
    async fn find_by_name(&self, name: &MemberName) -> Result<Option<Member>, InfraError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT id, name, department, position FROM members WHERE name = $1",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Member::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn MemberRepository>>();
    }
}
