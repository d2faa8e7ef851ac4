use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::dispatcher::{SuppressReason, TriggerVerdict};
use crate::domain::invocation::Invocation;
use crate::domain::trigger::TriggerEvent;

/// The ordered invocations produced for one trigger event.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchPlan {
    /// Schema version for output format stability.
    pub schema_version: u32,
    pub dispatcher: Option<String>,
    pub trigger: TriggerEvent,
    pub suppressed: Option<SuppressReason>,
    pub invocations: Vec<Invocation>,
    /// SHA-256 over the invocation list; equal plans share a digest.
    pub digest: String,
}

impl DispatchPlan {
    pub fn new(
        dispatcher: Option<String>,
        trigger: TriggerEvent,
        verdict: TriggerVerdict,
        invocations: Vec<Invocation>,
    ) -> Self {
        let (suppressed, invocations) = match verdict {
            TriggerVerdict::Accepted => (None, invocations),
            TriggerVerdict::Suppressed(reason) => (Some(reason), Vec::new()),
        };
        let digest = digest_invocations(&invocations);
        Self { schema_version: 1, dispatcher, trigger, suppressed, invocations, digest }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.is_some()
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    /// Invocation counts per job, in plan order.
    pub fn job_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for invocation in &self.invocations {
            match counts.iter_mut().find(|(job, _)| *job == invocation.job) {
                Some((_, count)) => *count += 1,
                None => counts.push((invocation.job.clone(), 1)),
            }
        }
        counts
    }
}

fn digest_invocations(invocations: &[Invocation]) -> String {
    let mut hasher = Sha256::new();
    for invocation in invocations {
        hasher.update(invocation.job.as_bytes());
        hasher.update([0]);
        hasher.update(invocation.workflow.file_name().as_bytes());
        for (name, value) in &invocation.inputs {
            hasher.update([0]);
            hasher.update(name.as_bytes());
            hasher.update([b'=']);
            hasher.update(value.as_bytes());
        }
        hasher.update([b'\n']);
    }
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}
