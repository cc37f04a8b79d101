use crate::profiles::{PROFILES, SiteType, TypeProfile};
use crate::summary::StructuralSummary;
use tracing::debug;

/// Keyword frequency above this count adds no further evidence.
pub const KEYWORD_FREQ_CAP: usize = 5;
/// Best normalized score below this yields the Unknown sentinel.
pub const MIN_TYPE_CONFIDENCE: f64 = 0.2;
/// Profiles scoring within this margin of each other count as tied.
pub const TIE_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
struct ProfileScore {
    index: usize,
    total: f64,
    structural: f64,
}

/// Scores the summary against every catalogue profile and returns the
/// winning type with its normalized confidence. Pure and deterministic:
/// ties within [`TIE_EPSILON`] prefer structural evidence, then catalogue
/// declaration order.
pub fn classify(summary: &StructuralSummary) -> (SiteType, f64) {
    if summary.is_empty() {
        return (SiteType::Unknown, 0.0);
    }

    let scores: Vec<ProfileScore> = PROFILES
        .iter()
        .enumerate()
        .map(|(index, profile)| {
            let (total, structural) = score_profile(profile, summary);
            debug!(
                "Profile {} scored {:.3} ({:.3} structural)",
                profile.site_type.as_str(),
                total,
                structural
            );
            ProfileScore {
                index,
                total,
                structural,
            }
        })
        .collect();

    let mut winner = scores[0];
    for challenger in &scores[1..] {
        winner = pick(winner, *challenger);
    }

    let confidence = winner.total;
    if confidence < MIN_TYPE_CONFIDENCE {
        (SiteType::Unknown, confidence)
    } else {
        (PROFILES[winner.index].site_type, confidence)
    }
}

/// Keeps the better of two profile scores. The challenger always has the
/// later catalogue index, so keeping `current` on a full tie implements
/// declaration-order preference.
fn pick(current: ProfileScore, challenger: ProfileScore) -> ProfileScore {
    if challenger.total > current.total + TIE_EPSILON {
        return challenger;
    }
    let tied = (challenger.total - current.total).abs() <= TIE_EPSILON;
    if tied && challenger.structural > current.structural {
        return challenger;
    }
    current
}

/// Normalized (total, structural-share) score of one profile. Each keyword
/// contributes up to its full weight, reached at [`KEYWORD_FREQ_CAP`]
/// occurrences; each structural signal contributes its weight when present.
fn score_profile(profile: &TypeProfile, summary: &StructuralSummary) -> (f64, f64) {
    let max = profile.max_score();

    let mut keyword = 0.0;
    for &(kw, weight) in profile.keywords {
        let freq = summary.keyword_count(kw).min(KEYWORD_FREQ_CAP);
        keyword += weight * freq as f64 / KEYWORD_FREQ_CAP as f64;
    }

    let mut structural = 0.0;
    for &(kind, weight) in profile.signals {
        if summary.regions.contains(&kind) {
            structural += weight;
        }
    }

    let total = ((keyword + structural) / max).clamp(0.0, 1.0);
    (total, structural / max)
}
