use crate::discover::CandidateUrl;
use crate::profiles::SiteType;
use crate::summary::RegionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flag thresholds, one named constant per flag so tuning happens in one
/// place. A flag is set when its capability confidence reaches the
/// threshold.
pub mod thresholds {
    pub const HAS_TOP_NAV: f64 = 0.5;
    pub const HAS_SIDE_NAV: f64 = 0.5;
    pub const HAS_PAGINATION: f64 = 0.5;
    pub const HAS_SEARCH: f64 = 0.5;
    pub const HAS_CATEGORY_INDEX: f64 = 0.5;
    pub const HAS_CONTENT_TABLE: f64 = 0.5;
}

const MAX_URLS_PER_SESSION: usize = 20;
const BUSY_CANDIDATE_COUNT: usize = 10;
const BUSY_DELAY_MS: u64 = 1000;
const QUIET_DELAY_MS: u64 = 500;
const PRIORITY_SCORE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DerivedFlag {
    HasTopNav,
    HasSideNav,
    HasPagination,
    HasSearch,
    HasCategoryIndex,
    HasContentTable,
}

impl DerivedFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedFlag::HasTopNav => "has_top_nav",
            DerivedFlag::HasSideNav => "has_side_nav",
            DerivedFlag::HasPagination => "has_pagination",
            DerivedFlag::HasSearch => "has_search",
            DerivedFlag::HasCategoryIndex => "has_category_index",
            DerivedFlag::HasContentTable => "has_content_table",
        }
    }

    pub fn for_region(kind: RegionKind) -> DerivedFlag {
        match kind {
            RegionKind::NavTop => DerivedFlag::HasTopNav,
            RegionKind::NavSide => DerivedFlag::HasSideNav,
            RegionKind::Pagination => DerivedFlag::HasPagination,
            RegionKind::SearchForm => DerivedFlag::HasSearch,
            RegionKind::CategoryList => DerivedFlag::HasCategoryIndex,
            RegionKind::ContentTable => DerivedFlag::HasContentTable,
        }
    }

    pub fn threshold(&self) -> f64 {
        match self {
            DerivedFlag::HasTopNav => thresholds::HAS_TOP_NAV,
            DerivedFlag::HasSideNav => thresholds::HAS_SIDE_NAV,
            DerivedFlag::HasPagination => thresholds::HAS_PAGINATION,
            DerivedFlag::HasSearch => thresholds::HAS_SEARCH,
            DerivedFlag::HasCategoryIndex => thresholds::HAS_CATEGORY_INDEX,
            DerivedFlag::HasContentTable => thresholds::HAS_CONTENT_TABLE,
        }
    }
}

/// Classification plus capability confidences for one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub site_type: SiteType,
    pub confidence: f64,
    pub capabilities: BTreeMap<RegionKind, f64>,
}

/// Recommended processing settings derived from the candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingHints {
    pub max_urls_per_session: usize,
    pub request_delay_ms: u64,
    pub priority_count: usize,
}

impl ProcessingHints {
    fn derive(candidates: &[CandidateUrl]) -> Self {
        Self {
            max_urls_per_session: candidates.len().min(MAX_URLS_PER_SESSION),
            request_delay_ms: if candidates.len() > BUSY_CANDIDATE_COUNT {
                BUSY_DELAY_MS
            } else {
                QUIET_DELAY_MS
            },
            priority_count: candidates.iter().filter(|c| c.score > PRIORITY_SCORE).count(),
        }
    }
}

/// The engine's single externally consumed output value: one immutable
/// processing configuration per analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfiguration {
    pub source_url: String,
    pub site_name: Option<String>,
    pub description: Option<String>,
    pub detection: DetectionResult,
    pub candidates: Vec<CandidateUrl>,
    pub derived_flags: BTreeMap<DerivedFlag, bool>,
    pub hints: ProcessingHints,
    pub generated_at: DateTime<Utc>,
}

/// Pure assembly: shapes detection output and ranked candidates into the
/// configuration value. No network or persistence side effects.
pub fn synthesize(
    source_url: &str,
    site_name: Option<String>,
    description: Option<String>,
    detection: DetectionResult,
    candidates: Vec<CandidateUrl>,
) -> SiteConfiguration {
    let mut derived_flags = BTreeMap::new();
    for kind in RegionKind::ALL {
        let flag = DerivedFlag::for_region(kind);
        let confidence = detection.capabilities.get(&kind).copied().unwrap_or(0.0);
        derived_flags.insert(flag, confidence >= flag.threshold());
    }

    let hints = ProcessingHints::derive(&candidates);
    SiteConfiguration {
        source_url: source_url.to_string(),
        site_name,
        description,
        detection,
        candidates,
        derived_flags,
        hints,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::UrlOrigin;

    fn detection_with(capabilities: &[(RegionKind, f64)]) -> DetectionResult {
        DetectionResult {
            site_type: SiteType::McqPlatform,
            confidence: 0.9,
            capabilities: capabilities.iter().copied().collect(),
        }
    }

    fn candidate(url: &str, score: f64) -> CandidateUrl {
        CandidateUrl {
            url: url.to_string(),
            anchor_text: "link".to_string(),
            score,
            origin: UrlOrigin::SameDomain,
        }
    }

    #[test]
    fn every_flag_is_present_and_thresholded() {
        let detection = detection_with(&[
            (RegionKind::NavTop, 0.9),
            (RegionKind::Pagination, 0.4),
        ]);
        let config = synthesize("https://example.com", None, None, detection, vec![]);
        assert_eq!(config.derived_flags.len(), RegionKind::ALL.len());
        assert_eq!(config.derived_flags[&DerivedFlag::HasTopNav], true);
        assert_eq!(config.derived_flags[&DerivedFlag::HasPagination], false);
        assert_eq!(config.derived_flags[&DerivedFlag::HasSearch], false);
    }

    #[test]
    fn crossing_a_threshold_flips_exactly_one_flag() {
        let below = synthesize(
            "https://example.com",
            None,
            None,
            detection_with(&[(RegionKind::Pagination, 0.49)]),
            vec![],
        );
        let above = synthesize(
            "https://example.com",
            None,
            None,
            detection_with(&[(RegionKind::Pagination, 0.51)]),
            vec![],
        );

        let mut changed = Vec::new();
        for (flag, value) in &below.derived_flags {
            if above.derived_flags[flag] != *value {
                changed.push(*flag);
            }
        }
        assert_eq!(changed, vec![DerivedFlag::HasPagination]);
    }

    #[test]
    fn candidate_order_is_preserved_verbatim() {
        let candidates = vec![
            candidate("https://example.com/a", 0.9),
            candidate("https://example.com/b", 0.5),
            candidate("https://example.com/c", 0.5),
        ];
        let config = synthesize(
            "https://example.com",
            None,
            None,
            detection_with(&[]),
            candidates.clone(),
        );
        let urls: Vec<_> = config.candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/a", "https://example.com/b", "https://example.com/c"]
        );
    }

    #[test]
    fn hints_follow_candidate_volume() {
        let few: Vec<CandidateUrl> = (0..4)
            .map(|i| candidate(&format!("https://example.com/{}", i), 0.9))
            .collect();
        let config = synthesize("https://example.com", None, None, detection_with(&[]), few);
        assert_eq!(config.hints.max_urls_per_session, 4);
        assert_eq!(config.hints.request_delay_ms, 500);
        assert_eq!(config.hints.priority_count, 4);

        let many: Vec<CandidateUrl> = (0..30)
            .map(|i| candidate(&format!("https://example.com/{}", i), 0.1))
            .collect();
        let config = synthesize("https://example.com", None, None, detection_with(&[]), many);
        assert_eq!(config.hints.max_urls_per_session, 20);
        assert_eq!(config.hints.request_delay_ms, 1000);
        assert_eq!(config.hints.priority_count, 0);
    }

    #[test]
    fn configuration_serializes_round_trip() {
        let config = synthesize(
            "https://example.com",
            Some("Example".to_string()),
            Some("An example site".to_string()),
            detection_with(&[(RegionKind::NavTop, 1.0)]),
            vec![candidate("https://example.com/a", 0.7)],
        );
        let json = serde_json::to_string(&config).unwrap();
        let back: SiteConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back.source_url, config.source_url);
        assert_eq!(back.candidates.len(), 1);
        assert_eq!(back.derived_flags, config.derived_flags);
    }
}
