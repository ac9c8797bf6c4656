//! Ad-hoc statement execution: admission policy, read-only execution and row normalization.

pub mod gateway;
pub mod policy;
pub mod rowset;

pub use gateway::StatementGateway;
pub use policy::{Admitted, QueryPolicy};
pub use rowset::{JsonRow, Rowset};
