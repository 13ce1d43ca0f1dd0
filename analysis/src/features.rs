//! Evaluation feature traces and the per-move deltas commentary draws on.
//!
//! A trace maps a named positional feature ("mobility", "king_safety", ...)
//! to its middlegame and endgame contribution, White-perspective, as the
//! backend's evaluator reported it.

use std::collections::BTreeMap;

use chess::{GameStage, PieceColor};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// How many feature deltas commentary looks at.
pub const TOP_FEATURES: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureValue {
    pub mg: f64,
    pub eg: f64,
}

impl FeatureValue {
    pub fn new(mg: f64, eg: f64) -> Self {
        Self { mg, eg }
    }

    /// The value that matters in `stage`: middlegame term in the opening,
    /// endgame term in the endgame, the average in between.
    pub fn at(&self, stage: GameStage) -> f64 {
        match stage {
            GameStage::Early => self.mg,
            GameStage::Mid => (self.mg + self.eg) / 2.0,
            GameStage::End => self.eg,
        }
    }
}

pub type FeatureTrace = BTreeMap<String, FeatureValue>;

/// Change of one feature across a move, from the mover's point of view.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDelta {
    pub name: String,
    pub delta: f64,
}

impl FeatureDelta {
    pub fn improved(&self) -> bool {
        self.delta > 0.0
    }

    /// "king_safety" → "king safety".
    pub fn label(&self) -> String {
        self.name.replace('_', " ")
    }
}

/// The [`TOP_FEATURES`] largest feature changes between two traces, by
/// absolute magnitude, positive meaning better for `mover`.
///
/// A feature missing from one side counts as zero there. Unchanged features
/// are left out; equal magnitudes keep name order.
pub fn top_feature_deltas(
    before: &FeatureTrace,
    after: &FeatureTrace,
    mover: PieceColor,
    stage: GameStage,
) -> SmallVec<[FeatureDelta; TOP_FEATURES]> {
    let sign = mover.sign() as f64;
    let zero = FeatureValue::default();

    let mut deltas: Vec<FeatureDelta> = before
        .keys()
        .chain(after.keys().filter(|name| !before.contains_key(*name)))
        .filter_map(|name| {
            let old = before.get(name).unwrap_or(&zero).at(stage);
            let new = after.get(name).unwrap_or(&zero).at(stage);
            let delta = (new - old) * sign;
            (delta != 0.0).then(|| FeatureDelta {
                name: name.clone(),
                delta,
            })
        })
        .collect();

    deltas.sort_by(|a, b| {
        b.delta
            .abs()
            .total_cmp(&a.delta.abs())
            .then_with(|| a.name.cmp(&b.name))
    });
    deltas.into_iter().take(TOP_FEATURES).collect()
}
