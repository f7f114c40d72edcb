//! Local cash-flow figures for the summary chart
//!
//! The plan's savings advice comes from the model; this is only the simple
//! income-minus-expenses split drawn next to it.

use super::UserProfile;

/// Expenses and potential savings for one month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    pub expenses: f64,
    pub savings: f64,
}

impl CashFlow {
    /// Savings never go below zero, even when expenses exceed income
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            expenses: profile.monthly_expenses,
            savings: (profile.monthly_income - profile.monthly_expenses).max(0.0),
        }
    }

    /// Fraction of the chart taken by savings, in `0.0..=1.0`
    pub fn savings_share(&self) -> f64 {
        let total = self.expenses + self.savings;
        if total <= 0.0 { 0.0 } else { self.savings / total }
    }
}

/// Whole amounts print without a trailing `.0`
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, RiskLevel};
    use proptest::prelude::*;

    fn profile(income: f64, expenses: f64) -> UserProfile {
        UserProfile {
            monthly_income: income,
            monthly_expenses: expenses,
            ..Default::default()
        }
    }

    #[test]
    fn test_overspending_farmer_has_zero_savings() {
        let farmer = UserProfile {
            category: Category::Farmer,
            monthly_income: 20000.0,
            monthly_expenses: 25000.0,
            risk_level: RiskLevel::Low,
            ..Default::default()
        };

        let flow = CashFlow::from_profile(&farmer);

        assert_eq!(flow.savings, 0.0);
        assert_eq!(flow.expenses, 25000.0);
        assert_eq!(flow.savings_share(), 0.0);
    }

    #[test]
    fn test_positive_savings() {
        let flow = CashFlow::from_profile(&profile(25000.0, 15000.0));
        assert_eq!(flow.savings, 10000.0);
        assert!((flow.savings_share() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_empty_chart() {
        let flow = CashFlow::from_profile(&profile(0.0, 0.0));
        assert_eq!(flow.savings_share(), 0.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(25000.0), "25000");
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(12500.5), "12500.5");
    }

    proptest! {
        #[test]
        fn prop_savings_never_negative(income in 0.0f64..1e7, expenses in 0.0f64..1e7) {
            let flow = CashFlow::from_profile(&profile(income, expenses));
            prop_assert!(flow.savings >= 0.0);
            prop_assert!((0.0..=1.0).contains(&flow.savings_share()));
        }
    }
}
