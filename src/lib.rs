pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::database_service::DatabaseService;
pub use domain::query::{Rowset, StatementGateway};
pub use error::{AppError, AppResult};
pub use infra::config::{AppConfig, DatabaseConfig, GatewayConfig};
