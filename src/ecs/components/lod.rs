//! Level-of-detail selection component.

use serde::{Deserialize, Serialize};

use crate::ecs::component::record_component;

/// Distance-based level of detail.
///
/// Threshold `i` is the boundary between level `i` and `i + 1`, so a
/// component with N thresholds has levels `0..=N`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "LodRecord")]
pub struct LodComponent {
    thresholds: Vec<f32>,
    #[serde(skip)]
    level: u32,
}

impl LodComponent {
    /// Create from transition distances. They are sorted ascending.
    pub fn new(thresholds: impl Into<Vec<f32>>) -> Self {
        let mut thresholds = thresholds.into();
        thresholds.retain(|t| !t.is_nan());
        thresholds.sort_by(f32::total_cmp);
        Self {
            thresholds,
            level: 0,
        }
    }

    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    /// Highest selectable level.
    pub fn max_lod(&self) -> u32 {
        self.thresholds.len() as u32
    }

    /// Level selected on the last update.
    pub fn level(&self) -> u32 {
        self.level
    }

    pub(crate) fn set_level(&mut self, level: u32) {
        self.level = level.min(self.max_lod());
    }
}

/// Persisted form; decoding goes through [`LodComponent::new`].
#[derive(Deserialize)]
struct LodRecord {
    #[serde(default)]
    thresholds: Vec<f32>,
}

impl From<LodRecord> for LodComponent {
    fn from(record: LodRecord) -> Self {
        Self::new(record.thresholds)
    }
}

/// Number of thresholds not exceeding `distance`, clamped to `max_lod`.
pub fn compute_lod(distance: f32, thresholds: &[f32], max_lod: u32) -> u32 {
    let passed = thresholds.iter().take_while(|t| **t <= distance).count() as u32;
    passed.min(max_lod)
}

record_component!(LodComponent, Lod);
