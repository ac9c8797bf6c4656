pub mod router;
pub mod types;
pub mod handlers {
    pub mod common;
    pub mod departments;
    pub mod employees;
    pub mod health;
    pub mod query;
    pub mod salary;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
