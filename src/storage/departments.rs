use super::{delete_by_id, require_match};
use crate::domain::model::{Department, DepartmentInput};
use crate::error::AppResult;
use sqlx::PgPool;

#[derive(Clone)]
pub struct DepartmentStore {
    pool: PgPool,
}

impl DepartmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Department>> {
        let rows = sqlx::query_as::<_, Department>(
            r#"SELECT "DepartmentID", "DepartmentName", "ManagerID" FROM "Department" ORDER BY "DepartmentID""#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, input: &DepartmentInput) -> AppResult<i32> {
        let id: i32 = sqlx::query_scalar(
            r#"INSERT INTO "Department" ("DepartmentName", "ManagerID") VALUES ($1, $2) RETURNING "DepartmentID""#,
        )
        .bind(&input.department_name)
        .bind(input.manager_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn update(&self, id: i32, input: &DepartmentInput) -> AppResult<()> {
        let result = sqlx::query(
            r#"UPDATE "Department" SET "DepartmentName" = $1, "ManagerID" = $2 WHERE "DepartmentID" = $3"#,
        )
        .bind(&input.department_name)
        .bind(input.manager_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        require_match::<Department>(result.rows_affected())
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        delete_by_id::<Department>(&self.pool, id).await
    }
}
