use serde::{Deserialize, Serialize};

/// Last observed health of one processor, as reported by its
/// `/payments/service-health` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub failing: bool,
    #[serde(rename = "minResponseTime")]
    pub min_response_time: u64,
}

impl HealthStatus {
    pub const fn healthy(min_response_time: u64) -> Self {
        Self {
            failing: false,
            min_response_time,
        }
    }

    /// What the router assumes when nothing trustworthy is known.
    pub const fn failing() -> Self {
        Self {
            failing: true,
            min_response_time: 0,
        }
    }

    pub fn or_failing(status: Option<HealthStatus>) -> Self {
        status.unwrap_or_else(Self::failing)
    }
}
