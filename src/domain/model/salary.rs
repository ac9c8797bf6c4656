use super::fields::{missing, FieldErrors};
use super::Resource;
use crate::error::AppError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// One entry of an employee's salary history.
#[derive(Serialize, Debug, Clone, PartialEq, sqlx::FromRow, ToSchema)]
pub struct SalaryStructure {
    #[serde(rename = "SalaryStructureID")]
    #[sqlx(rename = "SalaryStructureID")]
    pub salary_structure_id: i32,
    #[serde(rename = "EmployeeID")]
    #[sqlx(rename = "EmployeeID")]
    pub employee_id: i32,
    #[serde(rename = "BasicSalary", with = "rust_decimal::serde::float")]
    #[sqlx(rename = "BasicSalary")]
    #[schema(value_type = f64)]
    pub basic_salary: Decimal,
    #[serde(rename = "Allowances", with = "rust_decimal::serde::float")]
    #[sqlx(rename = "Allowances")]
    #[schema(value_type = f64)]
    pub allowances: Decimal,
    #[serde(rename = "EffectiveFrom")]
    #[sqlx(rename = "EffectiveFrom")]
    #[schema(value_type = String, example = "2024-04-01")]
    pub effective_from: NaiveDate,
    /// Open-ended when null.
    #[serde(rename = "EffectiveTo")]
    #[sqlx(rename = "EffectiveTo")]
    #[schema(value_type = Option<String>)]
    pub effective_to: Option<NaiveDate>,
}

impl Resource for SalaryStructure {
    const TABLE: &'static str = r#""SalaryStructure""#;
    const ID_COLUMN: &'static str = r#""SalaryStructureID""#;
    const LABEL: &'static str = "Salary record";
}

/// Body of `POST /salary`.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SalaryCreatePayload {
    #[serde(rename = "EmployeeID", default)]
    #[schema(value_type = i32)]
    pub employee_id: Option<JsonValue>,
    #[serde(rename = "BasicSalary", default)]
    #[schema(value_type = f64)]
    pub basic_salary: Option<JsonValue>,
    #[serde(rename = "Allowances", default)]
    #[schema(value_type = f64)]
    pub allowances: Option<JsonValue>,
    #[serde(rename = "EffectiveFrom", default)]
    #[schema(value_type = String, example = "2024-04-01")]
    pub effective_from: Option<JsonValue>,
    #[serde(rename = "EffectiveTo", default)]
    #[schema(value_type = Option<String>)]
    pub effective_to: Option<JsonValue>,
}

/// Body of `PUT /salary/:id`. The owning employee cannot be changed.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SalaryUpdatePayload {
    #[serde(rename = "BasicSalary", default)]
    #[schema(value_type = f64)]
    pub basic_salary: Option<JsonValue>,
    #[serde(rename = "Allowances", default)]
    #[schema(value_type = f64)]
    pub allowances: Option<JsonValue>,
    #[serde(rename = "EffectiveFrom", default)]
    #[schema(value_type = String, example = "2024-04-01")]
    pub effective_from: Option<JsonValue>,
    #[serde(rename = "EffectiveTo", default)]
    #[schema(value_type = Option<String>)]
    pub effective_to: Option<JsonValue>,
}

/// Validated mutable salary fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryUpdateInput {
    pub basic_salary: Decimal,
    pub allowances: Decimal,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalaryInput {
    pub employee_id: i32,
    pub terms: SalaryUpdateInput,
}

fn validate_terms(
    f: &mut FieldErrors,
    basic_salary: Option<&JsonValue>,
    allowances: Option<&JsonValue>,
    effective_from: Option<&JsonValue>,
    effective_to: Option<&JsonValue>,
) -> Option<SalaryUpdateInput> {
    let basic_salary = f.required_amount("BasicSalary", basic_salary);
    let allowances = f.required_amount("Allowances", allowances);
    let effective_from = f.required_date("EffectiveFrom", effective_from);
    let effective_to = f.date("EffectiveTo", effective_to);

    if let (Some(from), Some(to)) = (effective_from, effective_to) {
        if to < from {
            f.reject("EffectiveTo must not be earlier than EffectiveFrom");
        }
    }

    Some(SalaryUpdateInput {
        basic_salary: basic_salary?,
        allowances: allowances?,
        effective_from: effective_from?,
        effective_to,
    })
}

impl SalaryCreatePayload {
    pub fn validate(&self) -> Result<SalaryInput, AppError> {
        let mut f = FieldErrors::new();
        let employee_id = f.required_id("EmployeeID", self.employee_id.as_ref());
        let terms = validate_terms(
            &mut f,
            self.basic_salary.as_ref(),
            self.allowances.as_ref(),
            self.effective_from.as_ref(),
            self.effective_to.as_ref(),
        );
        f.finish()?;

        let (Some(employee_id), Some(terms)) = (employee_id, terms) else {
            return Err(missing("EmployeeID, BasicSalary, Allowances, EffectiveFrom"));
        };
        Ok(SalaryInput { employee_id, terms })
    }
}

impl SalaryUpdatePayload {
    pub fn validate(&self) -> Result<SalaryUpdateInput, AppError> {
        let mut f = FieldErrors::new();
        let terms = validate_terms(
            &mut f,
            self.basic_salary.as_ref(),
            self.allowances.as_ref(),
            self.effective_from.as_ref(),
            self.effective_to.as_ref(),
        );
        f.finish()?;
        terms.ok_or_else(|| missing("BasicSalary, Allowances, EffectiveFrom"))
    }
}
