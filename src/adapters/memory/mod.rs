//! In-memory adapters for tests and database-less local runs.

mod audit_log;
mod student_directory;
mod transaction_ledger;

pub use audit_log::InMemoryAuditLog;
pub use student_directory::InMemoryStudentDirectory;
pub use transaction_ledger::InMemoryTransactionLedger;
