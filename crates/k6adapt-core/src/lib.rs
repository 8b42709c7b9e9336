pub mod adapter;
pub mod config;
pub mod error;
pub mod scanner;

pub use adapter::{adapt, AdaptResult};
pub use config::{AdapterConfig, MultiMatchPolicy};
pub use error::{AdaptError, Result};
pub use scanner::{find_export_clauses, ExportClause, Span};
