use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::catalog::{
    default_sub_stage_of, is_valid_sub_stage_for_stage, valid_sub_stages_of, Stage, SubStage,
};

/// Per-job restriction of the global catalog.
///
/// Built once when a job is posted and never mutated afterwards. Construction normalises
/// the input: stages are sorted into catalog order, OFFER is always enabled, and
/// sub-stage entries that are unknown for their stage (or keyed by a disabled stage) are
/// dropped rather than rejected so stale configuration keeps loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PipelineConfigInput")]
pub struct PipelineConfig {
    enabled_stages: Vec<Stage>,
    allowed_sub_stages: BTreeMap<Stage, Vec<SubStage>>,
}

/// Unvalidated wire shape accepted when deserializing a [`PipelineConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfigInput {
    #[serde(default)]
    pub enabled_stages: Vec<Stage>,
    #[serde(default)]
    pub allowed_sub_stages: BTreeMap<Stage, Vec<SubStage>>,
}

impl From<PipelineConfigInput> for PipelineConfig {
    fn from(input: PipelineConfigInput) -> Self {
        Self::new(input.enabled_stages, input.allowed_sub_stages)
    }
}

impl PipelineConfig {
    pub fn new(
        enabled_stages: impl IntoIterator<Item = Stage>,
        allowed_sub_stages: BTreeMap<Stage, Vec<SubStage>>,
    ) -> Self {
        let mut enabled: Vec<Stage> = enabled_stages.into_iter().collect();
        enabled.push(Stage::Offer);
        enabled.sort();
        enabled.dedup();

        let allowed = allowed_sub_stages
            .into_iter()
            .filter(|(stage, _)| enabled.contains(stage))
            .map(|(stage, sub_stages)| {
                let mut kept: Vec<SubStage> = Vec::with_capacity(sub_stages.len());
                for sub_stage in sub_stages {
                    if is_valid_sub_stage_for_stage(stage, sub_stage) && !kept.contains(&sub_stage)
                    {
                        kept.push(sub_stage);
                    }
                }
                (stage, kept)
            })
            .collect();

        Self {
            enabled_stages: enabled,
            allowed_sub_stages: allowed,
        }
    }

    /// Every non-terminal stage enabled with its full catalog sub-stage set.
    pub fn standard() -> Self {
        let stages: Vec<Stage> = Stage::ordered()
            .into_iter()
            .filter(|stage| !stage.is_terminal())
            .collect();
        let allowed = stages
            .iter()
            .map(|stage| (*stage, valid_sub_stages_of(*stage).to_vec()))
            .collect();
        Self::new(stages, allowed)
    }

    pub fn enabled_stages(&self) -> &[Stage] {
        &self.enabled_stages
    }

    pub fn is_enabled(&self, stage: Stage) -> bool {
        self.enabled_stages.contains(&stage)
    }

    /// Index of `stage` within the job's enabled stages.
    pub fn position_of(&self, stage: Stage) -> Option<usize> {
        self.enabled_stages.iter().position(|enabled| *enabled == stage)
    }

    /// Sub-stages exactly as configured for the job, possibly empty.
    pub fn configured_sub_stages(&self, stage: Stage) -> &[SubStage] {
        self.allowed_sub_stages
            .get(&stage)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Usable sub-stages for `stage`; an empty configuration falls back to the
    /// catalog default alone.
    pub fn allowed_sub_stages(&self, stage: Stage) -> Vec<SubStage> {
        let configured = self.configured_sub_stages(stage);
        if configured.is_empty() {
            default_sub_stage_of(stage).into_iter().collect()
        } else {
            configured.to_vec()
        }
    }

    pub fn permits_sub_stage(&self, stage: Stage, sub_stage: SubStage) -> bool {
        self.allowed_sub_stages(stage).contains(&sub_stage)
    }

    /// Sub-stage assigned when a move names none: the catalog default when the job
    /// allows it, otherwise the first configured entry.
    pub fn resolve_default_sub_stage(&self, stage: Stage) -> Option<SubStage> {
        let allowed = self.allowed_sub_stages(stage);
        match default_sub_stage_of(stage) {
            Some(default) if allowed.contains(&default) => Some(default),
            _ => allowed.first().copied(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::standard()
    }
}
