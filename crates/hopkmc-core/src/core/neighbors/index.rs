use super::key::ShellKey;
use super::shell::{DistanceWindow, Neighbor, NeighborShell};
use crate::core::models::lattice::{LatticeError, LatticeModel};
use crate::core::models::material::{ELECTROSTATIC_SHELL_KEY, NeighborParams};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NeighborError {
    #[error("Unknown element type or malformed shell key: '{0}'")]
    UnknownElementType(String),
    #[error("Invalid cutoff {cutoff} for shell key '{key}'")]
    InvalidCutoff { key: String, cutoff: f64 },
    #[error("No shell {shell} for key '{key}'")]
    UnknownShell { key: String, shell: usize },
    #[error("Site {0} is not part of the lattice")]
    InvalidSite(usize),
    #[error("Lattice error: {0}")]
    Lattice(#[from] LatticeError),
}

/// Neighbor shells of a lattice, grouped by their textual key (`"Fe:Fe"`, `"E"`, ...).
///
/// Built once per lattice and shared read-only by every run on that lattice.
#[derive(Debug, Clone)]
pub struct NeighborIndex {
    delimiter: String,
    shells: BTreeMap<String, Vec<NeighborShell>>,
}

impl NeighborIndex {
    pub fn build(
        lattice: &LatticeModel,
        params: &NeighborParams,
        delimiter: &str,
    ) -> Result<Self, NeighborError> {
        let mut shells = BTreeMap::new();
        for (key, cutoffs) in &params.cutoffs {
            let shell_key = ShellKey::parse(key, delimiter, lattice)?;
            if let Some(&cutoff) = cutoffs.iter().find(|c| !c.is_finite() || **c <= 0.0) {
                return Err(NeighborError::InvalidCutoff {
                    key: key.clone(),
                    cutoff,
                });
            }

            let windows: Vec<DistanceWindow> = match shell_key {
                ShellKey::Electrostatic => {
                    if cutoffs.len() > 1 {
                        warn!(
                            key = %key,
                            ignored = cutoffs.len() - 1,
                            "Electrostatic shell uses only its first cutoff; the rest are ignored."
                        );
                    }
                    cutoffs
                        .first()
                        .map(|&cutoff| DistanceWindow::Sphere { cutoff })
                        .into_iter()
                        .collect()
                }
                ShellKey::Pair { .. } => cutoffs
                    .iter()
                    .map(|&cutoff| DistanceWindow::Band {
                        cutoff,
                        tolerance: params.tolerance,
                    })
                    .collect(),
            };

            let computed: Vec<NeighborShell> = windows
                .into_iter()
                .map(|window| NeighborShell::compute(lattice, shell_key, window))
                .collect();
            debug!(
                key = %key,
                shells = computed.len(),
                pairs = computed.iter().map(NeighborShell::total_pairs).sum::<usize>(),
                "Built neighbor shells."
            );
            shells.insert(key.clone(), computed);
        }
        Ok(Self {
            delimiter: delimiter.to_string(),
            shells,
        })
    }

    pub fn shells(&self, key: &str) -> Option<&[NeighborShell]> {
        self.shells.get(key).map(Vec::as_slice)
    }

    pub fn shell(&self, key: &str, shell: usize) -> Result<&NeighborShell, NeighborError> {
        self.shells
            .get(key)
            .and_then(|shells| shells.get(shell))
            .ok_or_else(|| NeighborError::UnknownShell {
                key: key.to_string(),
                shell,
            })
    }

    pub fn electrostatic(&self) -> Option<&NeighborShell> {
        self.shells
            .get(ELECTROSTATIC_SHELL_KEY)
            .and_then(|shells| shells.first())
    }

    /// Neighbors of an arbitrary site within shell `shell` of `key`.
    pub fn neighbors_of(
        &self,
        lattice: &LatticeModel,
        key: &str,
        shell: usize,
        sei: usize,
    ) -> Result<Vec<Neighbor>, NeighborError> {
        self.shell(key, shell)?.neighbors_of(lattice, sei)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.shells.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NeighborShell])> + '_ {
        self.shells.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }
}
