// Repository layer for database operations
//
// Every query that touches user-owned rows is scoped by `user_id`.

pub mod fixed_expense;
pub mod transaction;
pub mod user;

pub use fixed_expense::FixedExpenseRepository;
pub use transaction::TransactionRepository;
pub use user::UserRepository;
