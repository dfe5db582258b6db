use crate::domain::health::HealthStatus;
use crate::domain::payment::ProcessorName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateHealth {
    pub processor: ProcessorName,
    pub status: HealthStatus,
}

/// Decides which processors are worth trying for a payment and in what
/// order. Returning an empty list means nothing is viable.
pub trait RoutingPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn rank(&self, health: &[CandidateHealth]) -> Vec<ProcessorName>;
}

/// Lower is cheaper.
pub const fn fee_rank(processor: ProcessorName) -> u8 {
    match processor {
        ProcessorName::Default => 0,
        ProcessorName::Fallback => 1,
    }
}

fn is_viable(candidate: &CandidateHealth, max_response_time_ms: Option<u64>) -> bool {
    !candidate.status.failing
        && max_response_time_ms.map_or(true, |max| candidate.status.min_response_time <= max)
}

/// Cheapest healthy processor first. Response time only excludes a
/// processor when it exceeds the ceiling; it never reorders.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeePreferencePolicy {
    pub max_response_time_ms: Option<u64>,
}

impl FeePreferencePolicy {
    pub fn new(max_response_time_ms: Option<u64>) -> Self {
        Self {
            max_response_time_ms,
        }
    }
}

impl RoutingPolicy for FeePreferencePolicy {
    fn name(&self) -> &'static str {
        "fee_preference"
    }

    fn rank(&self, health: &[CandidateHealth]) -> Vec<ProcessorName> {
        let mut viable: Vec<ProcessorName> = health
            .iter()
            .filter(|c| is_viable(c, self.max_response_time_ms))
            .map(|c| c.processor)
            .collect();
        viable.sort_by_key(|p| fee_rank(*p));
        viable
    }
}

/// Healthy processors ordered by advertised response time, fee as the
/// tie-breaker.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastestFirstPolicy {
    pub max_response_time_ms: Option<u64>,
}

impl RoutingPolicy for FastestFirstPolicy {
    fn name(&self) -> &'static str {
        "fastest_first"
    }

    fn rank(&self, health: &[CandidateHealth]) -> Vec<ProcessorName> {
        let mut viable: Vec<&CandidateHealth> = health
            .iter()
            .filter(|c| is_viable(c, self.max_response_time_ms))
            .collect();
        viable.sort_by_key(|c| (c.status.min_response_time, fee_rank(c.processor)));
        viable.into_iter().map(|c| c.processor).collect()
    }
}
