use sqlx::PgPool;
use uuid::Uuid;

use serde::Serialize;

/// Subscription tiers, derived from paid payments rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Standard,
    Pro,
}

/// Feature limits per tier. `-1` means unlimited.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TierFeatures {
    pub name: &'static str,
    pub max_projects: i64,
    pub can_deploy_github: bool,
    pub can_deploy_vercel: bool,
    pub max_version_history: i64,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
}

const FREE: TierFeatures = TierFeatures {
    name: "Free",
    max_projects: 3,
    can_deploy_github: false,
    can_deploy_vercel: false,
    max_version_history: 5,
    rate_limit_requests: 10,
    rate_limit_window_secs: 60,
};

const STANDARD: TierFeatures = TierFeatures {
    name: "Standard",
    max_projects: 20,
    can_deploy_github: true,
    can_deploy_vercel: true,
    max_version_history: 20,
    rate_limit_requests: 50,
    rate_limit_window_secs: 60,
};

const PRO: TierFeatures = TierFeatures {
    name: "Pro",
    max_projects: -1,
    can_deploy_github: true,
    can_deploy_vercel: true,
    max_version_history: -1,
    rate_limit_requests: 200,
    rate_limit_window_secs: 60,
};

/// Paid-amount thresholds (minor currency units) within the trailing window.
const PRO_THRESHOLD: i64 = 500_000;
const STANDARD_THRESHOLD: i64 = 100_000;
const TIER_WINDOW_DAYS: i64 = 30;

impl Tier {
    pub fn features(self) -> TierFeatures {
        match self {
            Tier::Free => FREE,
            Tier::Standard => STANDARD,
            Tier::Pro => PRO,
        }
    }

    pub fn from_paid_total(total: i64) -> Self {
        if total >= PRO_THRESHOLD {
            Tier::Pro
        } else if total >= STANDARD_THRESHOLD {
            Tier::Standard
        } else {
            Tier::Free
        }
    }
}

/// Derive a user's tier from their paid payments over the last 30 days.
pub async fn user_tier(pool: &PgPool, user_id: Uuid) -> Result<Tier, sqlx::Error> {
    let total = crate::db::payments::paid_total_since(pool, user_id, TIER_WINDOW_DAYS).await?;
    Ok(Tier::from_paid_total(total))
}

/// True when `used` has reached a (possibly unlimited) limit.
pub fn limit_reached(used: i64, limit: i64) -> bool {
    limit >= 0 && used >= limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_map_to_tiers() {
        assert_eq!(Tier::from_paid_total(0), Tier::Free);
        assert_eq!(Tier::from_paid_total(99_999), Tier::Free);
        assert_eq!(Tier::from_paid_total(100_000), Tier::Standard);
        assert_eq!(Tier::from_paid_total(499_999), Tier::Standard);
        assert_eq!(Tier::from_paid_total(500_000), Tier::Pro);
    }

    #[test]
    fn unlimited_limits_never_trip() {
        assert!(!limit_reached(1_000_000, -1));
        assert!(limit_reached(3, 3));
        assert!(!limit_reached(2, 3));
    }

    #[test]
    fn free_tier_cannot_deploy() {
        assert!(!Tier::Free.features().can_deploy_github);
        assert!(Tier::Pro.features().can_deploy_vercel);
    }
}
