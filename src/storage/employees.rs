use super::{delete_by_id, require_match};
use crate::domain::model::{Employee, EmployeeInput, EmployeeWithDepartment};
use crate::error::AppResult;
use sqlx::PgPool;

#[derive(Clone)]
pub struct EmployeeStore {
    pool: PgPool,
}

impl EmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All employees with their department name (null when unassigned or the department is gone).
    pub async fn list(&self) -> AppResult<Vec<EmployeeWithDepartment>> {
        let rows = sqlx::query_as::<_, EmployeeWithDepartment>(
            r#"
            SELECT e."EmployeeID", e."FirstName", e."LastName", e."Email", e."Phone",
                   e."DateOfJoining", e."Position", e."DepartmentID", d."DepartmentName"
            FROM "Employee" e
            LEFT JOIN "Department" d ON e."DepartmentID" = d."DepartmentID"
            ORDER BY e."EmployeeID"
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Inserts an employee and returns the generated id.
    pub async fn create(&self, input: &EmployeeInput) -> AppResult<i32> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO "Employee"
                ("FirstName", "LastName", "Email", "Phone", "DateOfJoining", "DepartmentID", "Position")
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING "EmployeeID"
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.date_of_joining)
        .bind(input.department_id)
        .bind(&input.position)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Replaces every mutable field of employee `id`.
    pub async fn update(&self, id: i32, input: &EmployeeInput) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE "Employee"
            SET "FirstName" = $1, "LastName" = $2, "Email" = $3, "Phone" = $4,
                "DateOfJoining" = $5, "DepartmentID" = $6, "Position" = $7
            WHERE "EmployeeID" = $8
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.date_of_joining)
        .bind(input.department_id)
        .bind(&input.position)
        .bind(id)
        .execute(&self.pool)
        .await?;
        require_match::<Employee>(result.rows_affected())
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        delete_by_id::<Employee>(&self.pool, id).await
    }
}
