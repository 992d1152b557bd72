use crate::error::{Result, SalesAnalyticsError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One retail sales transaction.
///
/// Records are immutable once constructed; the store never rewrites a field
/// in place. `total_amount` is carried as given by the source rather than
/// recomputed — use [`SalesRecord::consistency_gap`] to check it against
/// `quantity * price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub branch: String,
    pub product: String,
    pub quantity: u64,
    /// Unit price, non-negative.
    pub price: Decimal,
    /// Transaction total as reported by the source, non-negative.
    pub total_amount: Decimal,
}

impl SalesRecord {
    pub fn new(
        date: NaiveDate,
        branch: impl Into<String>,
        product: impl Into<String>,
        quantity: u64,
        price: Decimal,
        total_amount: Decimal,
    ) -> Result<Self> {
        let record = Self {
            date,
            branch: branch.into(),
            product: product.into(),
            quantity,
            price,
            total_amount,
        };
        record.validate()?;
        Ok(record)
    }

    /// Checks the field constraints shared by load-time parsing and
    /// [`crate::SalesStore::append`].
    pub fn validate(&self) -> Result<()> {
        if self.branch.trim().is_empty() {
            return Err(SalesAnalyticsError::Validation {
                field: "branch",
                details: "branch identifier must be non-empty".to_string(),
            });
        }
        if self.product.trim().is_empty() {
            return Err(SalesAnalyticsError::Validation {
                field: "product",
                details: "product identifier must be non-empty".to_string(),
            });
        }
        if self.price < Decimal::ZERO {
            return Err(SalesAnalyticsError::Validation {
                field: "price",
                details: format!("unit price must be non-negative, got {}", self.price),
            });
        }
        if self.total_amount < Decimal::ZERO {
            return Err(SalesAnalyticsError::Validation {
                field: "total_amount",
                details: format!(
                    "transaction total must be non-negative, got {}",
                    self.total_amount
                ),
            });
        }
        Ok(())
    }

    /// The total this record would have if it were recomputed from
    /// `quantity * price`.
    pub fn expected_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }

    /// Absolute difference between the stored total and the recomputed one.
    /// Callers that want the `total_amount == quantity * price` invariant
    /// enforce their own tolerance on this.
    pub fn consistency_gap(&self) -> Decimal {
        (self.total_amount - self.expected_total()).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_valid_record() {
        let record = SalesRecord::new(
            date(2024, 1, 5),
            "BranchA",
            "Widget",
            2,
            dec!(10),
            dec!(20),
        );
        assert!(record.is_ok());
    }

    #[test]
    fn test_empty_branch_rejected() {
        let result = SalesRecord::new(date(2024, 1, 5), "  ", "Widget", 2, dec!(10), dec!(20));
        match result {
            Err(SalesAnalyticsError::Validation { field, .. }) => assert_eq!(field, "branch"),
            other => panic!("expected branch validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_product_rejected() {
        let result = SalesRecord::new(date(2024, 1, 5), "BranchA", "", 2, dec!(10), dec!(20));
        match result {
            Err(SalesAnalyticsError::Validation { field, .. }) => assert_eq!(field, "product"),
            other => panic!("expected product validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_price_rejected() {
        let result =
            SalesRecord::new(date(2024, 1, 5), "BranchA", "Widget", 2, dec!(-1), dec!(20));
        match result {
            Err(SalesAnalyticsError::Validation { field, .. }) => assert_eq!(field, "price"),
            other => panic!("expected price validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_total_rejected() {
        let result =
            SalesRecord::new(date(2024, 1, 5), "BranchA", "Widget", 2, dec!(10), dec!(-20));
        match result {
            Err(SalesAnalyticsError::Validation { field, .. }) => {
                assert_eq!(field, "total_amount")
            }
            other => panic!("expected total_amount validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_consistency_gap() {
        let record = SalesRecord::new(
            date(2024, 1, 5),
            "BranchA",
            "Widget",
            3,
            dec!(9.99),
            dec!(29.97),
        )
        .unwrap();
        assert_eq!(record.consistency_gap(), Decimal::ZERO);

        let skewed = SalesRecord::new(
            date(2024, 1, 5),
            "BranchA",
            "Widget",
            3,
            dec!(9.99),
            dec!(30.00),
        )
        .unwrap();
        assert_eq!(skewed.consistency_gap(), dec!(0.03));
    }
}
