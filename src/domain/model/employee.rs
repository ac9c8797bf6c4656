use super::fields::{missing, FieldErrors};
use super::Resource;
use crate::error::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

pub struct Employee;

impl Resource for Employee {
    const TABLE: &'static str = r#""Employee""#;
    const ID_COLUMN: &'static str = r#""EmployeeID""#;
    const LABEL: &'static str = "Employee";
}

/// Row returned by `GET /employees` (employee joined with its department name).
#[derive(Serialize, Debug, Clone, PartialEq, sqlx::FromRow, ToSchema)]
pub struct EmployeeWithDepartment {
    #[serde(rename = "EmployeeID")]
    #[sqlx(rename = "EmployeeID")]
    pub employee_id: i32,
    #[serde(rename = "FirstName")]
    #[sqlx(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    #[sqlx(rename = "LastName")]
    pub last_name: String,
    #[serde(rename = "Email")]
    #[sqlx(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    #[sqlx(rename = "Phone")]
    pub phone: Option<String>,
    #[serde(rename = "DateOfJoining")]
    #[sqlx(rename = "DateOfJoining")]
    #[schema(value_type = Option<String>, example = "2024-04-01")]
    pub date_of_joining: Option<NaiveDate>,
    #[serde(rename = "Position")]
    #[sqlx(rename = "Position")]
    pub position: Option<String>,
    #[serde(rename = "DepartmentID")]
    #[sqlx(rename = "DepartmentID")]
    pub department_id: Option<i32>,
    /// Null when the employee has no department.
    #[serde(rename = "DepartmentName")]
    #[sqlx(rename = "DepartmentName")]
    pub department_name: Option<String>,
}

/// Body of `POST /add-employee` and `PUT /employee/:id`.
///
/// Values are kept raw until [`EmployeePayload::validate`] coerces them.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct EmployeePayload {
    #[serde(rename = "FirstName", default)]
    #[schema(value_type = String)]
    pub first_name: Option<JsonValue>,
    #[serde(rename = "LastName", default)]
    #[schema(value_type = String)]
    pub last_name: Option<JsonValue>,
    #[serde(rename = "Email", default)]
    #[schema(value_type = String)]
    pub email: Option<JsonValue>,
    #[serde(rename = "Phone", default)]
    #[schema(value_type = Option<String>)]
    pub phone: Option<JsonValue>,
    #[serde(rename = "DateOfJoining", default)]
    #[schema(value_type = Option<String>, example = "2024-04-01")]
    pub date_of_joining: Option<JsonValue>,
    #[serde(rename = "DepartmentID", default)]
    #[schema(value_type = Option<i32>)]
    pub department_id: Option<JsonValue>,
    #[serde(rename = "Position", default)]
    #[schema(value_type = Option<String>)]
    pub position: Option<JsonValue>,
}

/// Validated employee fields, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_joining: Option<NaiveDate>,
    pub department_id: Option<i32>,
    pub position: Option<String>,
}

impl EmployeePayload {
    pub fn validate(&self) -> Result<EmployeeInput, AppError> {
        let mut f = FieldErrors::new();
        let first_name = f.required_text("FirstName", self.first_name.as_ref());
        let last_name = f.required_text("LastName", self.last_name.as_ref());
        let email = f.required_text("Email", self.email.as_ref());
        let phone = f.text("Phone", self.phone.as_ref());
        let date_of_joining = f.date("DateOfJoining", self.date_of_joining.as_ref());
        let department_id = f.id("DepartmentID", self.department_id.as_ref());
        let position = f.text("Position", self.position.as_ref());
        f.finish()?;

        let (Some(first_name), Some(last_name), Some(email)) = (first_name, last_name, email)
        else {
            return Err(missing("FirstName, LastName, Email"));
        };

        Ok(EmployeeInput {
            first_name,
            last_name,
            email,
            phone,
            date_of_joining,
            department_id,
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_payload_is_coerced() {
        let payload: EmployeePayload = serde_json::from_value(json!({
            "FirstName": "Asha",
            "LastName": "Rao",
            "Email": "asha@example.com",
            "Phone": "",
            "DateOfJoining": "2023-07-10",
            "DepartmentID": "2",
            "Position": "Analyst"
        }))
        .unwrap();
        let input = payload.validate().unwrap();
        assert_eq!(input.department_id, Some(2));
        assert_eq!(input.phone, None);
        assert_eq!(input.date_of_joining, NaiveDate::from_ymd_opt(2023, 7, 10));
    }

    #[test]
    fn missing_required_fields_are_listed() {
        let payload: EmployeePayload =
            serde_json::from_value(json!({ "FirstName": "Asha" })).unwrap();
        let err = payload.validate().unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert_eq!(err.to_string(), "Missing required fields: LastName, Email");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<EmployeePayload, _> = serde_json::from_value(json!({
            "FirstName": "Asha",
            "LastName": "Rao",
            "Email": "asha@example.com",
            "Salary": 100
        }));
        assert!(result.is_err());
    }
}
