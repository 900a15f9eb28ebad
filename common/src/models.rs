use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// User Models
// ============================================================================

/// User owns transactions, fixed expenses and a financial plan
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub monthly_income: Decimal,
    pub savings_target: Decimal,
    pub is_percent_target: bool,
    pub daily_limit: Decimal,
    #[serde(skip_serializing)]
    pub push_subscription: Option<sqlx::types::Json<PushSubscription>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A freshly registered user with an empty financial plan
    pub fn new(email: String, name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            password_hash,
            monthly_income: Decimal::ZERO,
            savings_target: Decimal::ZERO,
            is_percent_target: false,
            daily_limit: Decimal::ZERO,
            push_subscription: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn plan(&self) -> FinancialPlan {
        FinancialPlan {
            monthly_income: self.monthly_income,
            savings_target: self.savings_target,
            is_percent_target: self.is_percent_target,
        }
    }
}

/// Income and savings parameters the daily limit is derived from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialPlan {
    pub monthly_income: Decimal,
    pub savings_target: Decimal,
    pub is_percent_target: bool,
}

/// JWT claims issued at login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,   // Subject (user ID)
    pub email: String, // Login email
    pub exp: i64,      // Expiration time (Unix timestamp)
    pub iat: i64,      // Issued at (Unix timestamp)
}

impl UserClaims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

// ============================================================================
// Push Subscription Models
// ============================================================================

/// Web Push subscription as produced by `PushManager.subscribe()` in the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    pub keys: PushSubscriptionKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

// ============================================================================
// Ledger Models
// ============================================================================

/// A single logged expense
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
}

impl Transaction {
    pub fn new(user_id: Uuid, description: String, amount: Decimal, category: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            description,
            amount,
            category,
            date: Utc::now(),
        }
    }
}

/// Description prefix for transactions synthesized when a bill is paid
pub const BILL_PAYMENT_PREFIX: &str = "Payment for";

/// Category assigned to synthesized bill payments
pub const BILL_CATEGORY: &str = "Bills";

/// A recurring monthly bill with a fixed due day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FixedExpense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    /// Day of month, 1..=31
    pub due_date: i32,
    pub created_at: DateTime<Utc>,
}

impl FixedExpense {
    pub fn new(user_id: Uuid, name: String, amount: Decimal, due_date: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            amount,
            due_date,
            created_at: Utc::now(),
        }
    }

    /// The ledger entry recorded when this bill is paid; its description
    /// embeds the bill name so the reminder run can find it
    pub fn payment_transaction(&self) -> Transaction {
        Transaction::new(
            self.user_id,
            format!("{} {}", BILL_PAYMENT_PREFIX, self.name),
            self.amount,
            BILL_CATEGORY.to_string(),
        )
    }
}
