//! Volume-ratio bucket classification.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Discrete severity bucket for a volume ratio.
///
/// Declared from hottest to coolest; [`VolumeBucket::Neutral`] is reserved
/// for rows without a ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeBucket {
    AboveFive,
    AboveFour,
    AboveThree,
    AboveTwo,
    AboveOne,
    AtOrBelowOne,
    Neutral,
}

/// Lower bounds checked in descending order, first match wins.
const THRESHOLDS: [(f64, VolumeBucket); 5] = [
    (5.0, VolumeBucket::AboveFive),
    (4.0, VolumeBucket::AboveFour),
    (3.0, VolumeBucket::AboveThree),
    (2.0, VolumeBucket::AboveTwo),
    (1.0, VolumeBucket::AboveOne),
];

/// Classifies a volume ratio. Total over every `f64` and `None`.
///
/// NaN compares false against every threshold and lands in
/// [`VolumeBucket::AtOrBelowOne`].
pub fn classify(volume_ratio: Option<f64>) -> VolumeBucket {
    let Some(ratio) = volume_ratio else {
        return VolumeBucket::Neutral;
    };

    THRESHOLDS
        .iter()
        .find(|(bound, _)| ratio > *bound)
        .map(|(_, bucket)| *bucket)
        .unwrap_or(VolumeBucket::AtOrBelowOne)
}

impl VolumeBucket {
    pub const ALL: [Self; 7] = [
        Self::AboveFive,
        Self::AboveFour,
        Self::AboveThree,
        Self::AboveTwo,
        Self::AboveOne,
        Self::AtOrBelowOne,
        Self::Neutral,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::AboveFive => ">5",
            Self::AboveFour => ">4",
            Self::AboveThree => ">3",
            Self::AboveTwo => ">2",
            Self::AboveOne => ">1",
            Self::AtOrBelowOne => "<=1",
            Self::Neutral => "neutral",
        }
    }

    /// Chart colour used by the scatter view.
    pub const fn colour(self) -> &'static str {
        match self {
            Self::AboveFive => "red",
            Self::AboveFour => "crimson",
            Self::AboveThree => "pink",
            Self::AboveTwo => "brown",
            Self::AboveOne => "orange",
            Self::AtOrBelowOne => "blue",
            Self::Neutral => "grey",
        }
    }
}

impl Display for VolumeBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
