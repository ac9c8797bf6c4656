use crate::domain::model::{
    Department, DepartmentPayload, EmployeePayload, EmployeeWithDepartment, SalaryCreatePayload,
    SalaryStructure, SalaryUpdatePayload,
};
use crate::error::ErrorBody;
use crate::transport::http::handlers::{departments, employees, health, query, salary};
use crate::transport::http::types::{
    DepartmentCreatedResponse, EmployeeCreatedResponse, HealthResponse, MessageResponse,
    QueryRequest, QueryResponse, SalaryCreatedResponse, SalaryResponse,
};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        employees::list_employees_handler,
        employees::add_employee_handler,
        employees::update_employee_handler,
        employees::delete_employee_handler,
        departments::list_departments_handler,
        departments::create_department_handler,
        departments::update_department_handler,
        departments::delete_department_handler,
        salary::get_salary_handler,
        salary::create_salary_handler,
        salary::update_salary_handler,
        salary::delete_salary_handler,
        query::query_handler
    ),
    components(schemas(
        ErrorBody,
        HealthResponse,
        MessageResponse,
        EmployeeWithDepartment,
        EmployeePayload,
        EmployeeCreatedResponse,
        Department,
        DepartmentPayload,
        DepartmentCreatedResponse,
        SalaryStructure,
        SalaryCreatePayload,
        SalaryUpdatePayload,
        SalaryCreatedResponse,
        SalaryResponse,
        QueryRequest,
        QueryResponse
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/employees", get(employees::list_employees_handler))
        .route("/add-employee", post(employees::add_employee_handler))
        .route(
            "/employee/:id",
            put(employees::update_employee_handler).delete(employees::delete_employee_handler),
        )
        .route("/departments", get(departments::list_departments_handler))
        .route("/department", post(departments::create_department_handler))
        .route(
            "/department/:id",
            put(departments::update_department_handler)
                .delete(departments::delete_department_handler),
        )
        .route("/salary", post(salary::create_salary_handler))
        // One path segment serves both the employee id (GET) and the salary record id (PUT/DELETE).
        .route(
            "/salary/:id",
            get(salary::get_salary_handler)
                .put(salary::update_salary_handler)
                .delete(salary::delete_salary_handler),
        )
        .route("/query", post(query::query_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
