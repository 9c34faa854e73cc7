//! Score-Band Mapping
//!
//! Two independent, versioned threshold tables share the 1-6 band scale but
//! use different breakpoints: the MST path maps a final θ (with a Track-B
//! ceiling), while the section path maps four section bands and their
//! rounded average. The divergence is deliberate observed policy; do not
//! unify the tables without a policy decision.

use serde::{Deserialize, Serialize};

use crate::routing::Track;

/// Track-B test-takers structurally cannot be credited above this θ
pub const TRACK_B_THETA_CEILING: f64 = 1.09;

/// MST θ→band policy, ordered by descending lower bound. Each row is
/// (θ lower bound inclusive, band, CEFR, legacy range). The final row's
/// NEG_INFINITY bound makes the table total over the reals.
const MST_BAND_TABLE: &[(f64, f64, &str, &str)] = &[
    (1.75, 6.0, "C2", "8.5-9.0"),
    (1.45, 5.5, "C1", "8.0-8.5"),
    (1.10, 5.0, "C1", "7.0-7.5"),
    (0.75, 4.5, "B2", "6.5-7.0"),
    (0.40, 4.0, "B2", "6.0-6.5"),
    (0.05, 3.5, "B1", "5.5-6.0"),
    (-0.35, 3.0, "B1", "5.0-5.5"),
    (f64::NEG_INFINITY, 2.5, "A2", "4.0-4.5"),
];

/// Section-path band→label policy, ordered by descending lower bound.
/// Breakpoints intentionally differ from the MST table.
const SECTION_LABEL_TABLE: &[(f64, &str, &str)] = &[
    (5.75, "C2", "8.5-9.0"),
    (4.75, "C1", "7.5-8.5"),
    (3.75, "B2", "6.0-7.0"),
    (2.75, "B1", "5.0-5.5"),
    (1.75, "A2", "4.0-4.5"),
    (f64::NEG_INFINITY, "A1", "2.0-3.5"),
];

/// A derived score: band on the half-point 1-6 scale, CEFR label, and the
/// legacy numeric range string. Produced fresh on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandScore {
    pub band: f64,
    pub cefr: String,
    pub legacy_range: String,
}

/// Four per-section band scores on the 1-6 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionBands {
    pub reading: f64,
    pub listening: f64,
    pub speaking: f64,
    pub writing: f64,
}

/// Labelled report for the four sections plus their rounded average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    pub reading: BandScore,
    pub listening: BandScore,
    pub speaking: BandScore,
    pub writing: BandScore,
    pub total: BandScore,
}

/// Maps a final ability estimate to a band via the MST table, applying the
/// Track-B ceiling first. Total over all real θ.
pub fn mst_score(theta: f64, track: Track) -> BandScore {
    let capped = match track {
        Track::Easier => theta.min(TRACK_B_THETA_CEILING),
        Track::Harder => theta,
    };
    for &(lower, band, cefr, legacy) in MST_BAND_TABLE {
        if capped >= lower {
            return BandScore {
                band,
                cefr: cefr.to_string(),
                legacy_range: legacy.to_string(),
            };
        }
    }
    // only reachable for NaN, which takes the lowest band
    let (_, band, cefr, legacy) = MST_BAND_TABLE[MST_BAND_TABLE.len() - 1];
    BandScore {
        band,
        cefr: cefr.to_string(),
        legacy_range: legacy.to_string(),
    }
}

fn section_label(band: f64) -> BandScore {
    for &(lower, cefr, legacy) in SECTION_LABEL_TABLE {
        if band >= lower {
            return BandScore {
                band,
                cefr: cefr.to_string(),
                legacy_range: legacy.to_string(),
            };
        }
    }
    let (_, cefr, legacy) = SECTION_LABEL_TABLE[SECTION_LABEL_TABLE.len() - 1];
    BandScore {
        band,
        cefr: cefr.to_string(),
        legacy_range: legacy.to_string(),
    }
}

fn round_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

/// Labels each section band and the half-point-rounded four-section average.
pub fn section_report(sections: &SectionBands) -> SectionReport {
    let average =
        (sections.reading + sections.listening + sections.speaking + sections.writing) / 4.0;
    SectionReport {
        reading: section_label(sections.reading),
        listening: section_label(sections.listening),
        speaking: section_label(sections.speaking),
        writing: section_label(sections.writing),
        total: section_label(round_half(average)),
    }
}
