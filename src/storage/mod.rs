//! Parameterized statements for the managed tables, one store per resource.

pub mod departments;
pub mod employees;
pub mod salaries;

pub use departments::DepartmentStore;
pub use employees::EmployeeStore;
pub use salaries::SalaryStore;

use crate::domain::model::Resource;
use crate::error::AppResult;
use sqlx::PgPool;

/// Deletes one row by surrogate key; `NotFound` when nothing matched.
pub(crate) async fn delete_by_id<R: Resource>(pool: &PgPool, id: i32) -> AppResult<()> {
    let sql = format!("DELETE FROM {} WHERE {} = $1", R::TABLE, R::ID_COLUMN);
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(R::not_found());
    }
    Ok(())
}

/// Maps an update's affected-row count to `NotFound` when it is zero.
pub(crate) fn require_match<R: Resource>(rows_affected: u64) -> AppResult<()> {
    if rows_affected == 0 {
        Err(R::not_found())
    } else {
        Ok(())
    }
}
