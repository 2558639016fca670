//! PostgreSQL adapters - Database implementations for store ports.
//!
//! - `PostgresTransactionLedger` - payment transactions with conditional status flip
//! - `PostgresStudentDirectory` - student identity records
//! - `PostgresAuditLog` - admin audit trail

mod audit_log;
mod student_directory;
mod transaction_ledger;

pub use audit_log::PostgresAuditLog;
pub use student_directory::PostgresStudentDirectory;
pub use transaction_ledger::PostgresTransactionLedger;
