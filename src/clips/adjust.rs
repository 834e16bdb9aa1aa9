use anyhow::{Result, bail};
use std::str::FromStr;

use super::align::{AlignNote, AlignedSegment};

/// Smallest clip length a nudge may produce, in seconds
pub const MIN_CLIP_SECONDS: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

/// `PAIR:start|end:DELTA`, e.g. `2:end:-0.5`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub pair_index: usize,
    pub boundary: Boundary,
    pub delta: f64,
}

impl FromStr for Adjustment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [pair, boundary, delta] = parts.as_slice() else {
            return Err(format!("expected PAIR:start|end:DELTA, got '{s}'"));
        };

        let pair_index = pair
            .parse::<usize>()
            .ok()
            .filter(|idx| *idx > 0)
            .ok_or_else(|| format!("invalid pair number '{pair}'"))?;
        let boundary = match boundary.to_lowercase().as_str() {
            "start" => Boundary::Start,
            "end" => Boundary::End,
            other => return Err(format!("invalid boundary '{other}', expected start or end")),
        };
        let delta = delta
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .ok_or_else(|| format!("invalid delta '{delta}'"))?;

        Ok(Self {
            pair_index,
            boundary,
            delta,
        })
    }
}

/// Shift one boundary, keeping `0 <= start` and `start + MIN_CLIP_SECONDS <= end`
pub fn nudge(segment: &mut AlignedSegment, boundary: Boundary, delta: f64) {
    match boundary {
        Boundary::Start => {
            let start = (segment.start_final + delta)
                .min(segment.end_final - MIN_CLIP_SECONDS)
                .max(0.0);
            segment.start_final = start;
        }
        Boundary::End => {
            segment.end_final = (segment.end_final + delta).max(segment.start_final + MIN_CLIP_SECONDS);
        }
    }
    segment.note = AlignNote::ManuallyAdjusted;
}

/// Apply adjustments in order. Pairs are addressed by their ledger pair
/// number; naming a pair that is not in `segments` is an error.
pub fn apply_adjustments(segments: &mut [AlignedSegment], adjustments: &[Adjustment]) -> Result<()> {
    for adjustment in adjustments {
        let Some(segment) = segments
            .iter_mut()
            .find(|s| s.raw.pair_index == adjustment.pair_index)
        else {
            bail!(
                "cannot adjust pair #{}: no such segment to cut",
                adjustment.pair_index
            );
        };
        nudge(segment, adjustment.boundary, adjustment.delta);
    }
    Ok(())
}
