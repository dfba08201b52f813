//! Trust-region policy
//!
//! Builds per-replication footprints for the ranked candidates and runs
//! the [`TrustRegionPacker`] over them.

use super::{ReplannerPolicy, SelectionContext};
use crate::models::EnsembleError;
use crate::rng::RngManager;
use crate::selection::{PackerConfig, PackingCandidate, Selection, TrustRegionPacker};

/// Greedy trust-region selection
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustRegionPolicy {
    packer: TrustRegionPacker,
}

impl TrustRegionPolicy {
    pub fn new(config: PackerConfig) -> Self {
        Self {
            packer: TrustRegionPacker::new(config),
        }
    }

    fn packing_candidates(
        &self,
        ctx: &SelectionContext<'_>,
    ) -> Result<Vec<PackingCandidate>, EnsembleError> {
        let count_vacated = self.packer.config().count_vacated_slots;
        ctx.ranked
            .iter()
            .map(|scored| {
                let agent = ctx
                    .ensemble
                    .agents()
                    .get(scored.agent_index)
                    .filter(|a| a.id() == scored.agent_id)
                    .ok_or_else(|| EnsembleError::UnknownAgent(scored.agent_id.clone()))?;
                PackingCandidate::from_observations(scored, agent, count_vacated)
            })
            .collect()
    }
}

impl ReplannerPolicy for TrustRegionPolicy {
    fn name(&self) -> &'static str {
        "trust_region"
    }

    fn select(
        &mut self,
        ctx: &SelectionContext<'_>,
        _rng: &mut RngManager,
    ) -> Result<Selection, EnsembleError> {
        let candidates = self.packing_candidates(ctx)?;
        let outcome = self
            .packer
            .pack(&candidates, ctx.trust_region, ctx.ensemble.replications())?;

        let mut selection = Selection::new(self.name(), outcome.decisions);
        selection.ledger = Some(outcome.ledger);
        Ok(selection)
    }
}
