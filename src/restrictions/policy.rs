use crate::amount::Amount;
use crate::types::{AccountEntry, HistoricalAggregate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A configured threshold value. `Unlimited` disables that check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limit {
    Unlimited,
    Max(Amount),
}

impl Limit {
    /// Zero is how operators switch a threshold off.
    pub fn from_amount(amount: Amount) -> Self {
        if amount == Amount::ZERO {
            Limit::Unlimited
        } else {
            Limit::Max(amount)
        }
    }

    /// `true` if `value` stays within the limit. `None` means the projected
    /// value overflowed, which never fits.
    fn admits(self, value: Option<Amount>) -> bool {
        match (self, value) {
            (Limit::Unlimited, _) => true,
            (Limit::Max(_), None) => false,
            (Limit::Max(max), Some(value)) => value <= max,
        }
    }
}

/// Which threshold a proposed change would break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    DailyOutcome,
    MonthlyOutcome,
    AnnualOutcome,
    AnnualIncome,
    Balance,
}

impl Threshold {
    pub fn as_str(self) -> &'static str {
        match self {
            Threshold::DailyOutcome => "max_daily_outcome",
            Threshold::MonthlyOutcome => "max_monthly_outcome",
            Threshold::AnnualOutcome => "max_annual_outcome",
            Threshold::AnnualIncome => "max_annual_income",
            Threshold::Balance => "max_balance",
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an account falls under the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountClass {
    Anonymous,
    Verified,
}

impl AccountClass {
    pub fn of(account: &AccountEntry) -> Self {
        if account.is_anonymous() {
            AccountClass::Anonymous
        } else {
            AccountClass::Verified
        }
    }
}

/// What an operation would add on top of an account's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delta {
    pub outcome: Amount,
    pub income: Amount,
    /// Balance of the moved asset after the operation, when it grows.
    pub resulting_balance: Option<Amount>,
}

impl Delta {
    pub fn outcome(amount: Amount) -> Self {
        Self {
            outcome: amount,
            ..Self::default()
        }
    }

    pub fn income(amount: Amount, resulting_balance: Option<Amount>) -> Self {
        Self {
            income: amount,
            resulting_balance,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Exceeded(Threshold),
}

/// Spending and balance limits for anonymous accounts.
///
/// Built once from configuration and shared read-only by every validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionPolicy {
    pub max_daily_outcome: Limit,
    pub max_monthly_outcome: Limit,
    pub max_annual_outcome: Limit,
    pub max_annual_income: Limit,
    pub max_balance: Limit,
}

impl Default for RestrictionPolicy {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl RestrictionPolicy {
    pub fn unlimited() -> Self {
        Self {
            max_daily_outcome: Limit::Unlimited,
            max_monthly_outcome: Limit::Unlimited,
            max_annual_outcome: Limit::Unlimited,
            max_annual_income: Limit::Unlimited,
            max_balance: Limit::Unlimited,
        }
    }

    /// Applies `delta` to the projected `aggregate` and compares every
    /// configured threshold. Verified accounts are always allowed.
    ///
    /// A value landing exactly on a threshold is allowed; only going
    /// strictly above it is rejected.
    pub fn check(
        &self,
        class: AccountClass,
        delta: &Delta,
        aggregate: &HistoricalAggregate,
    ) -> Verdict {
        if class != AccountClass::Anonymous {
            return Verdict::Allowed;
        }

        if delta.outcome.is_positive() {
            let checks = [
                (self.max_daily_outcome, aggregate.daily_outcome, Threshold::DailyOutcome),
                (self.max_monthly_outcome, aggregate.monthly_outcome, Threshold::MonthlyOutcome),
                (self.max_annual_outcome, aggregate.annual_outcome, Threshold::AnnualOutcome),
            ];
            for (limit, current, threshold) in checks {
                if !limit.admits(current.checked_add(delta.outcome)) {
                    return Verdict::Exceeded(threshold);
                }
            }
        }

        if delta.income.is_positive()
            && !self
                .max_annual_income
                .admits(aggregate.annual_income.checked_add(delta.income))
        {
            return Verdict::Exceeded(Threshold::AnnualIncome);
        }

        if let Some(balance) = delta.resulting_balance {
            if !self.max_balance.admits(Some(balance)) {
                return Verdict::Exceeded(Threshold::Balance);
            }
        }

        Verdict::Allowed
    }
}
