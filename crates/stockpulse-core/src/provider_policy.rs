use std::time::Duration;

use crate::ProviderId;

/// Per-provider quota and backoff policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub max_concurrency: usize,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub retry_backoff: BackoffPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_retries: u32,
}

impl ProviderPolicy {
    /// FMP starter-tier pacing: the original sync job spaced requests
    /// half a second apart, which this quota reproduces as a budget.
    pub fn fmp_default() -> Self {
        Self {
            provider_id: ProviderId::Fmp,
            max_concurrency: 4,
            quota_window: Duration::from_secs(5),
            quota_limit: 10,
            retry_backoff: BackoffPolicy {
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(30),
                multiplier: 2.0,
                max_retries: 3,
            },
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Fmp => Self::fmp_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmp_policy_matches_half_second_pacing() {
        let policy = ProviderPolicy::fmp_default();

        assert_eq!(policy.provider_id, ProviderId::Fmp);
        assert_eq!(
            policy.quota_window.as_secs_f64() / f64::from(policy.quota_limit),
            0.5
        );
    }
}
