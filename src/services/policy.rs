//! Tier policy resolution
//!
//! A member's borrowing rules are a pure function of their subscription
//! facts and the lending configuration. Nothing is cached: a tier change
//! takes effect on the member's next action.

use crate::{
    config::LendingConfig,
    models::member::{Member, SubscriptionStatus, SubscriptionType},
};

/// The borrowing rules in force for one member, right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    pub max_concurrent_loans: i64,
    pub loan_days: i64,
    pub max_renewals: i16,
}

/// Is this subscription a paid plan in good standing?
fn is_premium(subscription_type: SubscriptionType, subscription_status: SubscriptionStatus) -> bool {
    matches!(
        subscription_type,
        SubscriptionType::Monthly | SubscriptionType::Yearly
    ) && subscription_status == SubscriptionStatus::Active
}

/// Resolve the loan policy for a subscription
pub fn resolve(
    subscription_type: SubscriptionType,
    subscription_status: SubscriptionStatus,
    config: &LendingConfig,
) -> LoanPolicy {
    if is_premium(subscription_type, subscription_status) {
        LoanPolicy {
            max_concurrent_loans: config.premium_max_loans,
            loan_days: config.premium_loan_days,
            max_renewals: config.max_renewals,
        }
    } else {
        LoanPolicy {
            max_concurrent_loans: config.general_max_loans,
            loan_days: config.general_loan_days,
            max_renewals: config.max_renewals,
        }
    }
}

/// Resolve the loan policy for a member record
pub fn resolve_for(member: &Member, config: &LendingConfig) -> LoanPolicy {
    resolve(member.subscription_type, member.subscription_status, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LendingConfig {
        LendingConfig::default()
    }

    #[test]
    fn test_active_monthly_is_premium() {
        let policy = resolve(SubscriptionType::Monthly, SubscriptionStatus::Active, &config());
        assert_eq!(policy.max_concurrent_loans, config().premium_max_loans);
        assert_eq!(policy.loan_days, config().premium_loan_days);
    }

    #[test]
    fn test_active_yearly_is_premium() {
        let policy = resolve(SubscriptionType::Yearly, SubscriptionStatus::Active, &config());
        assert_eq!(policy.loan_days, config().premium_loan_days);
    }

    #[test]
    fn test_cancelled_yearly_falls_back_to_general() {
        let policy = resolve(SubscriptionType::Yearly, SubscriptionStatus::Cancelled, &config());
        assert_eq!(policy.max_concurrent_loans, config().general_max_loans);
        assert_eq!(policy.loan_days, config().general_loan_days);
    }

    #[test]
    fn test_free_tier_is_general_even_when_active() {
        let policy = resolve(SubscriptionType::Free, SubscriptionStatus::Active, &config());
        assert_eq!(policy.max_concurrent_loans, config().general_max_loans);
    }

    #[test]
    fn test_renewal_cap_is_tier_independent() {
        let premium = resolve(SubscriptionType::Monthly, SubscriptionStatus::Active, &config());
        let general = resolve(SubscriptionType::Free, SubscriptionStatus::Active, &config());
        assert_eq!(premium.max_renewals, general.max_renewals);
    }
}
