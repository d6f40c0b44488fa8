use std::collections::BTreeMap;

/// Lifecycle of a [`KmcEngine`](super::kmc::KmcEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Finished,
}

/// Counters collected over one KMC run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunStatistics {
    pub steps: usize,
    /// Accepted hops per `(channel key, rate class name)`.
    pub hops_per_class: BTreeMap<(String, String), usize>,
    /// Largest number of simultaneously available processes seen at any step.
    pub max_processes: usize,
    pub total_time: f64,
}

impl RunStatistics {
    pub(crate) fn record_hop(&mut self, channel: &str, class: &str) {
        *self
            .hops_per_class
            .entry((channel.to_string(), class.to_string()))
            .or_insert(0) += 1;
    }

    pub fn total_hops(&self) -> usize {
        self.hops_per_class.values().sum()
    }

    /// Merges the counters of another run into this one.
    pub fn merge(&mut self, other: &RunStatistics) {
        self.steps += other.steps;
        self.total_time += other.total_time;
        self.max_processes = self.max_processes.max(other.max_processes);
        for (class, count) in &other.hops_per_class {
            *self.hops_per_class.entry(class.clone()).or_insert(0) += count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_merge_accumulate_counts() {
        let mut a = RunStatistics::default();
        a.record_hop("Fe:Fe", "basal");
        a.record_hop("Fe:Fe", "basal");
        a.steps = 2;
        a.max_processes = 3;

        let mut b = RunStatistics::default();
        b.record_hop("Fe:Fe", "c-direction");
        b.steps = 1;
        b.max_processes = 6;

        a.merge(&b);
        assert_eq!(a.steps, 3);
        assert_eq!(a.max_processes, 6);
        assert_eq!(a.total_hops(), 3);
        assert_eq!(
            a.hops_per_class[&("Fe:Fe".to_string(), "basal".to_string())],
            2
        );
    }
}
