// Bill reminder engine

use crate::errors::{DatabaseError, NotificationError};
use crate::models::FixedExpense;
use crate::notification::{Delivery, NotificationService, PushPayload};
use crate::schedule::{local_date, start_of_month, DailySchedule};
use crate::scheduler::source::ReminderSource;
use crate::telemetry;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

/// Scheduler trait for the reminder loop
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Sleep until each configured fire time and run the reminder scan,
    /// until `stop` is called
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Signal the loop to exit. A run already in progress completes first,
    /// and a `start` issued after `stop` returns at once.
    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Scan the bills due on the local date of `now` and remind their owners
    async fn run_once(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ReminderReport, Box<dyn std::error::Error + Send + Sync>>;
}

/// Tally of a single reminder run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub date: Option<NaiveDate>,
    pub due: usize,
    pub already_paid: usize,
    pub sent: usize,
    pub skipped_no_subscription: usize,
    pub failed: usize,
}

enum ReminderOutcome {
    AlreadyPaid,
    Delivered(Delivery),
}

/// Daily bill-due scanner
pub struct BillReminderEngine {
    schedule: DailySchedule,
    source: Arc<dyn ReminderSource>,
    notifications: NotificationService,
    shutdown_tx: watch::Sender<bool>,
}

impl BillReminderEngine {
    pub fn new(
        schedule: DailySchedule,
        source: Arc<dyn ReminderSource>,
        notifications: NotificationService,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            schedule,
            source,
            notifications,
            shutdown_tx,
        }
    }

    #[instrument(skip(self, expense), fields(expense_id = %expense.id, user_id = %expense.user_id))]
    async fn remind(
        &self,
        expense: &FixedExpense,
        month_start: DateTime<Utc>,
    ) -> Result<ReminderOutcome, NotificationError> {
        let paid = self
            .source
            .has_payment_since(expense.user_id, &expense.name, month_start)
            .await?;
        if paid {
            debug!("Bill already paid this month");
            return Ok(ReminderOutcome::AlreadyPaid);
        }

        let payload = PushPayload::bill_reminder(&expense.name, expense.amount);
        let delivery = self
            .notifications
            .notify_user(expense.user_id, &payload)
            .await?;
        Ok(ReminderOutcome::Delivered(delivery))
    }

    async fn scan(&self, now: DateTime<Utc>) -> Result<ReminderReport, DatabaseError> {
        let timezone = self.schedule.timezone();
        let today = local_date(now, timezone);
        let month_start = start_of_month(today, timezone);

        let expenses = self.source.find_due_expenses(today.day()).await?;
        let mut report = ReminderReport {
            date: Some(today),
            due: expenses.len(),
            ..ReminderReport::default()
        };

        for expense in &expenses {
            match self.remind(expense, month_start).await {
                Ok(ReminderOutcome::AlreadyPaid) => {
                    report.already_paid += 1;
                    telemetry::record_reminder_skipped("already_paid");
                }
                Ok(ReminderOutcome::Delivered(Delivery::Sent)) => {
                    report.sent += 1;
                    telemetry::record_reminder_sent();
                }
                Ok(ReminderOutcome::Delivered(Delivery::NoSubscription)) => {
                    report.skipped_no_subscription += 1;
                    telemetry::record_reminder_skipped("no_subscription");
                }
                Err(e) => {
                    report.failed += 1;
                    telemetry::record_reminder_failed(failure_reason(&e));
                    error!(
                        expense_id = %expense.id,
                        user_id = %expense.user_id,
                        error = %e,
                        "Failed to send bill reminder"
                    );
                    // Continue with the remaining bills
                }
            }
        }

        Ok(report)
    }
}

fn failure_reason(err: &NotificationError) -> &'static str {
    match err {
        NotificationError::GatewayRequestFailed(_) => "gateway_unreachable",
        NotificationError::GatewayRejected { .. } => "gateway_rejected",
        NotificationError::InvalidSubscription(_) => "invalid_subscription",
        NotificationError::Lookup(_) => "lookup_failed",
    }
}

#[async_trait]
impl Scheduler for BillReminderEngine {
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(timezone = %self.schedule.timezone(), "Starting bill reminder scheduler");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            if *shutdown_rx.borrow_and_update() {
                info!("Shutdown requested, stopping bill reminder scheduler");
                break;
            }

            let now = Utc::now();
            let next_run = self.schedule.next_after(now)?;
            let wait = (next_run - now).to_std().unwrap_or(Duration::ZERO);
            info!(next_run = %next_run, "Next bill reminder run scheduled");

            tokio::select! {
                _ = sleep(wait) => {
                    if let Err(e) = self.run_once(Utc::now()).await {
                        error!(error = %e, "Bill reminder run aborted");
                    }
                }
                _ = shutdown_rx.changed() => {}
            }
        }

        info!("Bill reminder scheduler stopped");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Stopping bill reminder scheduler");
        // Stored even without a receiver so a later start sees it
        self.shutdown_tx.send_replace(true);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn run_once(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ReminderReport, Box<dyn std::error::Error + Send + Sync>> {
        let started = Instant::now();

        let report = self.scan(now).await.map_err(|e| {
            error!(error = %e, "Failed to load fixed expenses due today");
            e
        })?;

        telemetry::record_reminder_run(report.due, started.elapsed().as_secs_f64());
        info!(
            due = report.due,
            already_paid = report.already_paid,
            sent = report.sent,
            skipped_no_subscription = report.skipped_no_subscription,
            failed = report.failed,
            "Bill reminder run completed"
        );

        Ok(report)
    }
}
