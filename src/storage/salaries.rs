use super::{delete_by_id, require_match};
use crate::domain::model::{SalaryInput, SalaryStructure, SalaryUpdateInput};
use crate::error::AppResult;
use sqlx::PgPool;

#[derive(Clone)]
pub struct SalaryStore {
    pool: PgPool,
}

impl SalaryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The current salary: latest `EffectiveFrom`, newest record first on ties.
    pub async fn latest_for_employee(&self, employee_id: i32) -> AppResult<Option<SalaryStructure>> {
        let row = sqlx::query_as::<_, SalaryStructure>(
            r#"
            SELECT "SalaryStructureID", "EmployeeID", "BasicSalary", "Allowances",
                   "EffectiveFrom", "EffectiveTo"
            FROM "SalaryStructure"
            WHERE "EmployeeID" = $1
            ORDER BY "EffectiveFrom" DESC, "SalaryStructureID" DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, input: &SalaryInput) -> AppResult<i32> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO "SalaryStructure"
                ("EmployeeID", "BasicSalary", "Allowances", "EffectiveFrom", "EffectiveTo")
            VALUES ($1, $2, $3, $4, $5)
            RETURNING "SalaryStructureID"
            "#,
        )
        .bind(input.employee_id)
        .bind(input.terms.basic_salary)
        .bind(input.terms.allowances)
        .bind(input.terms.effective_from)
        .bind(input.terms.effective_to)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn update(&self, id: i32, terms: &SalaryUpdateInput) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE "SalaryStructure"
            SET "BasicSalary" = $1, "Allowances" = $2, "EffectiveFrom" = $3, "EffectiveTo" = $4
            WHERE "SalaryStructureID" = $5
            "#,
        )
        .bind(terms.basic_salary)
        .bind(terms.allowances)
        .bind(terms.effective_from)
        .bind(terms.effective_to)
        .bind(id)
        .execute(&self.pool)
        .await?;
        require_match::<SalaryStructure>(result.rows_affected())
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        delete_by_id::<SalaryStructure>(&self.pool, id).await
    }
}
