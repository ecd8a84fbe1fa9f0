//! Read-side aggregation over the communication store.

use crate::classifier::ErrorKind;
use crate::communication::{AgentFramework, Communication};
use crate::tracker::CommunicationStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Remediation hint attached to every quota report.
pub const QUOTA_RECOMMENDATION: &str = "Please check your OpenAI account billing and usage limits at https://platform.openai.com/account/billing";

/// Breakdown key for failures recorded without a classification.
const UNCLASSIFIED_ERROR: &str = "unknown";

/// Aggregate statistics over completed communications.
///
/// With no completed communications only `total` and `completed` are present,
/// both zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunicationStats {
    pub total: usize,
    pub completed: usize,
    #[serde(flatten)]
    pub summary: Option<StatsSummary>,
}

impl CommunicationStats {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub active: usize,
    pub errors: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub average_response_time_ms: u64,
    pub by_framework: BTreeMap<AgentFramework, FrameworkStats>,
    pub error_breakdown: BTreeMap<String, ErrorBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameworkStats {
    pub count: usize,
    pub tokens: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBreakdown {
    pub count: usize,
    pub latest_error: ErrorSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorSnapshot {
    pub message: Option<String>,
    pub code: Option<u16>,
    pub timestamp: DateTime<Utc>,
    pub agent: String,
}

impl ErrorSnapshot {
    fn of(comm: &Communication) -> Self {
        Self {
            message: comm.error_message.clone(),
            code: comm.error_code,
            timestamp: comm.session_start,
            agent: comm.agent_name.clone(),
        }
    }
}

/// Summary of quota-exceeded failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaReport {
    pub has_quota_errors: bool,
    #[serde(flatten)]
    pub details: Option<QuotaDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaDetails {
    pub total_quota_errors: usize,
    pub latest_quota_error: QuotaErrorSnapshot,
    pub affected_agents: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaErrorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub agent_name: String,
    pub error_message: Option<String>,
    pub patient_id: Option<String>,
    pub scenario_type: String,
}

/// Liveness counters for health endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerHealth {
    pub active_sessions: usize,
    pub total_communications: usize,
}

/// Returns the later of two records by `session_start`; ties go to `candidate`,
/// which is the one inserted later.
fn later<'a>(
    current: Option<&'a Communication>,
    candidate: &'a Communication,
) -> &'a Communication {
    match current {
        Some(current) if current.session_start > candidate.session_start => current,
        _ => candidate,
    }
}

pub(crate) fn compute_stats(store: &CommunicationStore) -> CommunicationStats {
    let completed: Vec<&Communication> = store.iter().filter(|c| c.is_completed()).collect();

    if completed.is_empty() {
        return CommunicationStats {
            total: 0,
            completed: 0,
            summary: None,
        };
    }

    let total_tokens = completed
        .iter()
        .fold(0u64, |acc, c| acc.saturating_add(c.total_tokens));
    let total_cost: f64 = completed.iter().map(|c| c.cost_estimate).sum();
    let total_response_ms = completed
        .iter()
        .fold(0u64, |acc, c| acc.saturating_add(c.response_time_ms));
    let average_response_time_ms = total_response_ms / completed.len() as u64;

    let mut by_framework: BTreeMap<AgentFramework, FrameworkStats> = AgentFramework::ALL
        .iter()
        .map(|framework| (*framework, FrameworkStats::default()))
        .collect();
    for comm in &completed {
        let entry = by_framework.entry(comm.framework).or_default();
        entry.count += 1;
        entry.tokens = entry.tokens.saturating_add(comm.total_tokens);
        entry.cost += comm.cost_estimate;
    }

    let mut errors = 0;
    let mut latest_by_type: BTreeMap<String, (usize, &Communication)> = BTreeMap::new();
    for comm in completed.iter().copied().filter(|c| c.has_error()) {
        errors += 1;
        let key = comm
            .error_type
            .map(|kind| kind.as_str())
            .unwrap_or(UNCLASSIFIED_ERROR)
            .to_string();
        latest_by_type
            .entry(key)
            .and_modify(|(count, latest)| {
                *count += 1;
                *latest = later(Some(*latest), comm);
            })
            .or_insert((1, comm));
    }

    let error_breakdown = latest_by_type
        .into_iter()
        .map(|(key, (count, latest))| {
            (
                key,
                ErrorBreakdown {
                    count,
                    latest_error: ErrorSnapshot::of(latest),
                },
            )
        })
        .collect();

    CommunicationStats {
        total: store.len(),
        completed: completed.len(),
        summary: Some(StatsSummary {
            active: store.active_count(),
            errors,
            total_tokens,
            total_cost,
            average_response_time_ms,
            by_framework,
            error_breakdown,
        }),
    }
}

pub(crate) fn compute_quota_report(store: &CommunicationStore) -> QuotaReport {
    let quota_errors: Vec<&Communication> = store
        .iter()
        .filter(|c| c.error_type == Some(ErrorKind::QuotaExceeded))
        .collect();

    let Some(latest) = quota_errors
        .iter()
        .copied()
        .fold(None, |current, candidate| Some(later(current, candidate)))
    else {
        return QuotaReport {
            has_quota_errors: false,
            details: None,
        };
    };

    let affected_agents: BTreeSet<String> = quota_errors
        .iter()
        .map(|c| c.agent_name.clone())
        .collect();

    QuotaReport {
        has_quota_errors: true,
        details: Some(QuotaDetails {
            total_quota_errors: quota_errors.len(),
            latest_quota_error: QuotaErrorSnapshot {
                timestamp: latest.session_start,
                agent_name: latest.agent_name.clone(),
                error_message: latest.error_message.clone(),
                patient_id: latest.patient_id.clone(),
                scenario_type: latest.scenario_type.clone(),
            },
            affected_agents: affected_agents.into_iter().collect(),
            recommendation: QUOTA_RECOMMENDATION.to_string(),
        }),
    }
}

pub(crate) fn compute_health(store: &CommunicationStore) -> TrackerHealth {
    TrackerHealth {
        active_sessions: store.active_count(),
        total_communications: store.len(),
    }
}
