use async_trait::async_trait;
use sqlx::{postgres::PgArguments, query::QueryAs, PgPool, Postgres};

use crate::analysis::repo_types::{Analysis, AnalysisFields};

/// Every query is scoped to `owner`; a row owned by someone else is
/// indistinguishable from a missing one.
#[async_trait]
pub trait AnalysisRepo: Send + Sync {
    async fn create_analysis(&self, owner: i32, fields: AnalysisFields) -> anyhow::Result<Analysis>;
    async fn list_analyses(&self, owner: i32) -> anyhow::Result<Vec<Analysis>>;
    async fn find_analysis(&self, id: i32, owner: i32) -> anyhow::Result<Option<Analysis>>;
    async fn update_analysis(
        &self,
        id: i32,
        owner: i32,
        patch: AnalysisFields,
    ) -> anyhow::Result<Option<Analysis>>;
    async fn delete_analysis(&self, id: i32, owner: i32) -> anyhow::Result<bool>;
}

macro_rules! analysis_columns {
    () => {
        "id, year, semester, subject, id_group, id_department, count_stud, \
         count5, count4, count3, count2, count_passed, count_released, \
         count_not_cert, count_acad_leave, count_expelled, \
         quality::float8 AS quality, overall, average, created_at, updated_at, id_user"
    };
}

type AnalysisQuery<'q> = QueryAs<'q, Postgres, Analysis, PgArguments>;

/// Binds the writable columns in declaration order ($1..$18).
fn bind_fields(q: AnalysisQuery<'_>, f: AnalysisFields) -> AnalysisQuery<'_> {
    q.bind(f.year)
        .bind(f.semester)
        .bind(f.subject)
        .bind(f.id_group)
        .bind(f.id_department)
        .bind(f.count_stud)
        .bind(f.count5)
        .bind(f.count4)
        .bind(f.count3)
        .bind(f.count2)
        .bind(f.count_passed)
        .bind(f.count_released)
        .bind(f.count_not_cert)
        .bind(f.count_acad_leave)
        .bind(f.count_expelled)
        .bind(f.quality)
        .bind(f.overall)
        .bind(f.average)
}

#[async_trait]
impl AnalysisRepo for PgPool {
    async fn create_analysis(&self, owner: i32, fields: AnalysisFields) -> anyhow::Result<Analysis> {
        let q = sqlx::query_as::<_, Analysis>(concat!(
            "INSERT INTO analysis (year, semester, subject, id_group, id_department, count_stud, \
             count5, count4, count3, count2, count_passed, count_released, count_not_cert, \
             count_acad_leave, count_expelled, quality, overall, average, id_user) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19) RETURNING ",
            analysis_columns!()
        ));
        let row = bind_fields(q, fields).bind(owner).fetch_one(self).await?;
        Ok(row)
    }

    async fn list_analyses(&self, owner: i32) -> anyhow::Result<Vec<Analysis>> {
        let rows = sqlx::query_as::<_, Analysis>(concat!(
            "SELECT ",
            analysis_columns!(),
            " FROM analysis WHERE id_user = $1 ORDER BY id"
        ))
        .bind(owner)
        .fetch_all(self)
        .await?;
        Ok(rows)
    }

    async fn find_analysis(&self, id: i32, owner: i32) -> anyhow::Result<Option<Analysis>> {
        let row = sqlx::query_as::<_, Analysis>(concat!(
            "SELECT ",
            analysis_columns!(),
            " FROM analysis WHERE id = $1 AND id_user = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self)
        .await?;
        Ok(row)
    }

    async fn update_analysis(
        &self,
        id: i32,
        owner: i32,
        patch: AnalysisFields,
    ) -> anyhow::Result<Option<Analysis>> {
        // NULL parameters keep the stored column
        let q = sqlx::query_as::<_, Analysis>(concat!(
            "UPDATE analysis SET year = COALESCE($1, year), semester = COALESCE($2, semester), \
             subject = COALESCE($3, subject), id_group = COALESCE($4, id_group), \
             id_department = COALESCE($5, id_department), \
             count_stud = COALESCE($6, count_stud), count5 = COALESCE($7, count5), \
             count4 = COALESCE($8, count4), count3 = COALESCE($9, count3), \
             count2 = COALESCE($10, count2), count_passed = COALESCE($11, count_passed), \
             count_released = COALESCE($12, count_released), \
             count_not_cert = COALESCE($13, count_not_cert), \
             count_acad_leave = COALESCE($14, count_acad_leave), \
             count_expelled = COALESCE($15, count_expelled), \
             quality = COALESCE($16::numeric, quality), overall = COALESCE($17, overall), \
             average = COALESCE($18, average), updated_at = now() \
             WHERE id = $19 AND id_user = $20 RETURNING ",
            analysis_columns!()
        ));
        let row = bind_fields(q, patch)
            .bind(id)
            .bind(owner)
            .fetch_optional(self)
            .await?;
        Ok(row)
    }

    async fn delete_analysis(&self, id: i32, owner: i32) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM analysis WHERE id = $1 AND id_user = $2")
            .bind(id)
            .bind(owner)
            .execute(self)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
