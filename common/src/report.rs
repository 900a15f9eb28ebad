//! Category spending reports.

use crate::models::Transaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Total spent in one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub categories: Vec<CategoryTotal>,
    pub total_expense: Decimal,
    pub transaction_count: usize,
}

/// Group transactions by category, largest total first
pub fn category_breakdown(transactions: &[Transaction]) -> CategoryReport {
    let mut by_category: HashMap<&str, (Decimal, usize)> = HashMap::new();
    for tx in transactions {
        let entry = by_category
            .entry(tx.category.as_str())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let mut categories: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
        })
        .collect();
    categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

    CategoryReport {
        total_expense: transactions.iter().map(|tx| tx.amount).sum(),
        transaction_count: transactions.len(),
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn tx(category: &str, amount: Decimal) -> Transaction {
        Transaction::new(Uuid::nil(), "item".to_string(), amount, category.to_string())
    }

    #[test]
    fn test_empty_report() {
        let report = category_breakdown(&[]);
        assert!(report.categories.is_empty());
        assert_eq!(report.total_expense, Decimal::ZERO);
        assert_eq!(report.transaction_count, 0);
    }

    #[test]
    fn test_groups_and_orders_by_total() {
        let transactions = vec![
            tx("Food", dec!(25000)),
            tx("Transport", dec!(15000)),
            tx("Food", dec!(40000)),
            tx("Bills", dec!(350000)),
        ];
        let report = category_breakdown(&transactions);

        let names: Vec<&str> = report.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Bills", "Food", "Transport"]);
        assert_eq!(report.categories[1].total, dec!(65000));
        assert_eq!(report.categories[1].count, 2);
        assert_eq!(report.total_expense, dec!(430000));
        assert_eq!(report.transaction_count, 4);
    }

    #[test]
    fn test_ties_ordered_by_name() {
        let transactions = vec![tx("Snacks", dec!(10)), tx("Coffee", dec!(10))];
        let report = category_breakdown(&transactions);
        assert_eq!(report.categories[0].category, "Coffee");
    }
}
