use super::fields::{missing, FieldErrors};
use super::Resource;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

#[derive(Serialize, Debug, Clone, PartialEq, sqlx::FromRow, ToSchema)]
pub struct Department {
    #[serde(rename = "DepartmentID")]
    #[sqlx(rename = "DepartmentID")]
    pub department_id: i32,
    #[serde(rename = "DepartmentName")]
    #[sqlx(rename = "DepartmentName")]
    pub department_name: String,
    /// Advisory employee id; not enforced by the schema.
    #[serde(rename = "ManagerID")]
    #[sqlx(rename = "ManagerID")]
    pub manager_id: Option<i32>,
}

impl Resource for Department {
    const TABLE: &'static str = r#""Department""#;
    const ID_COLUMN: &'static str = r#""DepartmentID""#;
    const LABEL: &'static str = "Department";
}

/// Body of `POST /department` and `PUT /department/:id`.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DepartmentPayload {
    #[serde(rename = "DepartmentName", default)]
    #[schema(value_type = String)]
    pub department_name: Option<JsonValue>,
    #[serde(rename = "ManagerID", default)]
    #[schema(value_type = Option<i32>)]
    pub manager_id: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentInput {
    pub department_name: String,
    pub manager_id: Option<i32>,
}

impl DepartmentPayload {
    pub fn validate(&self) -> Result<DepartmentInput, AppError> {
        let mut f = FieldErrors::new();
        let department_name = f.required_text("DepartmentName", self.department_name.as_ref());
        let manager_id = f.id("ManagerID", self.manager_id.as_ref());
        f.finish()?;

        let Some(department_name) = department_name else {
            return Err(missing("DepartmentName"));
        };
        Ok(DepartmentInput {
            department_name,
            manager_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manager_is_optional() {
        let payload: DepartmentPayload =
            serde_json::from_value(json!({ "DepartmentName": "Eng", "ManagerID": null })).unwrap();
        assert_eq!(
            payload.validate().unwrap(),
            DepartmentInput {
                department_name: "Eng".to_string(),
                manager_id: None
            }
        );
    }

    #[test]
    fn name_is_required() {
        let payload: DepartmentPayload =
            serde_json::from_value(json!({ "ManagerID": 3 })).unwrap();
        assert_eq!(
            payload.validate().unwrap_err().to_string(),
            "Missing required fields: DepartmentName"
        );
    }
}
