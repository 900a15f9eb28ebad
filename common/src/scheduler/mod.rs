// Bill reminder scheduler: daily scan of fixed expenses due today

pub mod engine;
pub mod source;

pub use engine::{BillReminderEngine, ReminderReport, Scheduler};
pub use source::{PostgresReminderSource, ReminderSource};
