use crate::config::CLASS_COUNT;
use crate::error::PipelineError;

/// Scores must beat this to count; every valid probability does.
const SCORE_FLOOR: f32 = -1.0;

/// Flower species known to the model, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClassLabel {
    Daisy,
    Dandelion,
    Rose,
    Sunflower,
    Tulip,
}

impl ClassLabel {
    pub const ALL: [ClassLabel; CLASS_COUNT] = [
        ClassLabel::Daisy,
        ClassLabel::Dandelion,
        ClassLabel::Rose,
        ClassLabel::Sunflower,
        ClassLabel::Tulip,
    ];

    /// Label for a model output position
    pub fn from_index(index: usize) -> Option<ClassLabel> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ClassLabel::Daisy => "Daisy",
            ClassLabel::Dandelion => "Dandelion",
            ClassLabel::Rose => "Rose",
            ClassLabel::Sunflower => "Sunflower",
            ClassLabel::Tulip => "Tulip",
        }
    }
}

/// The decided label and the score that won.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Classification {
    pub label: ClassLabel,
    pub confidence: f32,
}

/// Picks the highest scoring class
/// Scans left to right with a strict comparison, so the first of several
/// equal maxima wins.
/// param scores: one score per class, in `ClassLabel` order
/// returns the winning label and its score
pub fn decide(scores: &[f32]) -> Result<Classification, PipelineError> {
    if scores.len() != CLASS_COUNT {
        return Err(PipelineError::InvalidScores);
    }

    let mut best: Option<usize> = None;
    let mut max_prob = SCORE_FLOOR;
    for (i, &score) in scores.iter().enumerate() {
        if score > max_prob {
            max_prob = score;
            best = Some(i);
        }
    }

    // NaN never compares greater, so an all-NaN vector lands here
    let label = best
        .and_then(ClassLabel::from_index)
        .ok_or(PipelineError::InvalidScores)?;
    Ok(Classification {
        label,
        confidence: max_prob,
    })
}
