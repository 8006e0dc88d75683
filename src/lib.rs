//! circulate - Library circulation desk and password policy toolkit
//!
//! Two independent components behind one small CLI:
//! - A pure password policy checker: candidate password in, structured
//!   verdict out, with the retry/prompt loop owned by the host layer.
//! - An in-memory circulation desk tracking books, borrowers, checkouts,
//!   due dates, and overdue fines for the lifetime of the process.
//!
//! # Modules
//!
//! - `password`: Password policy rules and validation
//! - `catalog`: Books, borrowers, and circulation operations
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Validate password candidates for a username, read from stdin
//! circulate password ekta
//!
//! # Run the circulation demonstration sequence
//! circulate demo
//! ```

pub mod catalog;
pub mod cli;
pub mod password;

// Re-export main types at crate root for convenience
pub use catalog::{
    Book, BookId, Borrower, Catalog, CatalogError, CheckoutReceipt, LoanPolicy, OverdueEntry,
    OverdueReport, ReturnReceipt, UserId,
};
pub use password::{PasswordRules, PolicyViolation};
