use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ClipError;
use super::parser::RawSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignMode {
    /// Cut at the marked timestamps
    None,
    /// Snap inward to the nearest keyframes, falling back to the marks
    #[default]
    Keyframe,
}

impl AlignMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AlignMode::None => "none",
            AlignMode::Keyframe => "keyframe",
        }
    }
}

impl fmt::Display for AlignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlignMode {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(AlignMode::None),
            "keyframe" => Ok(AlignMode::Keyframe),
            _ => Err(ClipError::UnsupportedMode(s.to_string())),
        }
    }
}

/// Why the final boundaries are what they are
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignNote {
    NotRequested,
    NoKeyframeData,
    Degenerate,
    Aligned,
    ManuallyAdjusted,
}

impl AlignNote {
    pub fn as_str(self) -> &'static str {
        match self {
            AlignNote::NotRequested => "no alignment requested",
            AlignNote::NoKeyframeData => "no keyframe data",
            AlignNote::Degenerate => "alignment degenerate",
            AlignNote::Aligned => "aligned",
            AlignNote::ManuallyAdjusted => "manually adjusted",
        }
    }
}

impl fmt::Display for AlignNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyframe timestamps in ascending order, non-finite values removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keyframes(Vec<f64>);

impl Keyframes {
    pub fn new(mut times: Vec<f64>) -> Self {
        times.retain(|t| t.is_finite());
        times.sort_by(f64::total_cmp);
        times.dedup();
        Self(times)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// First keyframe at or after `t`, else the last keyframe
    pub fn at_or_after(&self, t: f64) -> Option<f64> {
        let idx = self.0.partition_point(|&k| k < t);
        self.0.get(idx).or_else(|| self.0.last()).copied()
    }

    /// Last keyframe at or before `t`, else the first keyframe
    pub fn at_or_before(&self, t: f64) -> Option<f64> {
        let idx = self.0.partition_point(|&k| k <= t);
        match idx {
            0 => self.0.first().copied(),
            n => self.0.get(n - 1).copied(),
        }
    }
}

impl From<Vec<f64>> for Keyframes {
    fn from(times: Vec<f64>) -> Self {
        Self::new(times)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSegment {
    pub raw: RawSegment,
    pub start_final: f64,
    pub end_final: f64,
    pub used_keyframe_alignment: bool,
    pub note: AlignNote,
}

impl AlignedSegment {
    fn passthrough(raw: &RawSegment, note: AlignNote) -> Self {
        Self {
            raw: raw.clone(),
            start_final: raw.start_sec,
            end_final: raw.end_sec,
            used_keyframe_alignment: false,
            note,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_final - self.start_final
    }
}

/// Align one segment against `keyframes`. Pure; segments never influence
/// each other.
pub fn align_segment(raw: &RawSegment, keyframes: &Keyframes, mode: AlignMode) -> AlignedSegment {
    if mode == AlignMode::None {
        return AlignedSegment::passthrough(raw, AlignNote::NotRequested);
    }

    let (Some(start), Some(end)) = (
        keyframes.at_or_after(raw.start_sec),
        keyframes.at_or_before(raw.end_sec),
    ) else {
        return AlignedSegment::passthrough(raw, AlignNote::NoKeyframeData);
    };

    if start >= end {
        return AlignedSegment::passthrough(raw, AlignNote::Degenerate);
    }

    AlignedSegment {
        raw: raw.clone(),
        start_final: start,
        end_final: end,
        used_keyframe_alignment: true,
        note: AlignNote::Aligned,
    }
}

pub fn align_segments(raw: &[RawSegment], keyframes: &Keyframes, mode: AlignMode) -> Vec<AlignedSegment> {
    raw.iter()
        .map(|segment| align_segment(segment, keyframes, mode))
        .collect()
}
