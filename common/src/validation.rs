// Request validation shared by the API handlers
//
// Each check appends to a list so clients get every rejected field at once.

use crate::errors::{FieldError, ValidationError};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex");
}

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_TEXT_LEN: usize = 255;
pub const MAX_CATEGORY_LEN: usize = 50;

/// Decimal places a `NUMERIC(18, 2)` money column keeps
pub const MONEY_SCALE: u32 = 2;

/// Exclusive upper bound on money magnitudes, the range of `NUMERIC(18, 2)`
pub fn money_limit() -> Decimal {
    Decimal::from(10_000_000_000_000_000_i64)
}

/// Collects field errors for one request body
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !EMAIL_REGEX.is_match(value.trim()) {
            self.reject(field, "must be a valid email address");
        }
        self
    }

    /// Length bounds on the trimmed value, counted in characters
    pub fn text(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len < min {
            if min <= 1 {
                self.reject(field, "is required");
            } else {
                self.reject(field, format!("must be at least {} characters", min));
            }
        } else if len > max {
            self.reject(field, format!("must be at most {} characters", max));
        }
        self
    }

    pub fn positive(&mut self, field: &str, value: Decimal) -> &mut Self {
        if value <= Decimal::ZERO {
            self.reject(field, "must be greater than 0");
        }
        self
    }

    pub fn non_negative(&mut self, field: &str, value: Decimal) -> &mut Self {
        if value < Decimal::ZERO {
            self.reject(field, "must not be negative");
        }
        self
    }

    /// Amount storable without rounding: at most two decimals and below
    /// [`money_limit`] in magnitude
    pub fn money(&mut self, field: &str, value: Decimal) -> &mut Self {
        if value.normalize().scale() > MONEY_SCALE {
            self.reject(field, format!("must have at most {} decimal places", MONEY_SCALE));
        }
        if value.abs() >= money_limit() {
            self.reject(field, format!("must be less than {}", money_limit()));
        }
        self
    }

    pub fn at_most(&mut self, field: &str, value: Decimal, max: Decimal) -> &mut Self {
        if value > max {
            self.reject(field, format!("must not exceed {}", max));
        }
        self
    }

    pub fn int_range(&mut self, field: &str, value: i32, min: i32, max: i32) -> &mut Self {
        if value < min || value > max {
            self.reject(field, format!("must be between {} and {}", min, max));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(std::mem::take(&mut self.errors)))
        }
    }
}

pub fn validate_registration(email: &str, password: &str, name: &str) -> Result<(), ValidationError> {
    Validator::new()
        .email("email", email)
        .text("password", password, MIN_PASSWORD_LEN, MAX_TEXT_LEN)
        .text("name", name, MIN_NAME_LEN, MAX_TEXT_LEN)
        .finish()
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    Validator::new()
        .email("email", email)
        .text("password", password, 1, MAX_TEXT_LEN)
        .finish()
}

pub fn validate_transaction(
    description: &str,
    amount: Decimal,
    category: &str,
) -> Result<(), ValidationError> {
    Validator::new()
        .text("description", description, 1, MAX_TEXT_LEN)
        .positive("amount", amount)
        .money("amount", amount)
        .text("category", category, 1, MAX_CATEGORY_LEN)
        .finish()
}

pub fn validate_fixed_expense(name: &str, amount: Decimal, due_date: i32) -> Result<(), ValidationError> {
    Validator::new()
        .text("name", name, 1, MAX_TEXT_LEN)
        .positive("amount", amount)
        .money("amount", amount)
        .int_range("due_date", due_date, 1, 31)
        .finish()
}

pub fn validate_financial_plan(
    monthly_income: Decimal,
    savings_target: Decimal,
    is_percent_target: bool,
) -> Result<(), ValidationError> {
    let mut validator = Validator::new();
    validator
        .non_negative("monthly_income", monthly_income)
        .money("monthly_income", monthly_income)
        .non_negative("savings_target", savings_target)
        .money("savings_target", savings_target);
    if is_percent_target {
        validator.at_most("savings_target", savings_target, Decimal::ONE_HUNDRED);
    }
    validator.finish()
}

/// Manual daily limit override
pub fn validate_daily_limit(daily_limit: Decimal) -> Result<(), ValidationError> {
    Validator::new()
        .non_negative("daily_limit", daily_limit)
        .money("daily_limit", daily_limit)
        .finish()
}
