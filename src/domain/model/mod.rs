//! Resource definitions: persisted rows, request payloads and their validation.

pub mod department;
pub mod employee;
pub mod fields;
pub mod salary;

pub use department::{Department, DepartmentInput, DepartmentPayload};
pub use employee::{Employee, EmployeeInput, EmployeePayload, EmployeeWithDepartment};
pub use fields::FieldErrors;
pub use salary::{
    SalaryCreatePayload, SalaryInput, SalaryStructure, SalaryUpdateInput, SalaryUpdatePayload,
};

/// Static description of a table managed by the CRUD controller.
///
/// Identifiers are PascalCase in the schema, so they are stored here already quoted.
pub trait Resource {
    /// Quoted table name, e.g. `"Employee"`.
    const TABLE: &'static str;
    /// Quoted surrogate key column, e.g. `"EmployeeID"`.
    const ID_COLUMN: &'static str;
    /// Human readable name used in messages and logs.
    const LABEL: &'static str;

    fn not_found() -> crate::error::AppError {
        crate::error::AppError::NotFound(format!("{} not found", Self::LABEL))
    }
}
