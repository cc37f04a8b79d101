use crate::summary::RegionKind;
use serde::{Deserialize, Serialize};

/// Coarse content-category label for a website. `Unknown` is the explicit
/// below-threshold sentinel, never a catalogue member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SiteType {
    McqPlatform,
    ExamPrep,
    Educational,
    NewsPortal,
    Government,
    Blog,
    ECommerce,
    Forum,
    Unknown,
}

impl SiteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteType::McqPlatform => "mcq_platform",
            SiteType::ExamPrep => "exam_prep",
            SiteType::Educational => "educational",
            SiteType::NewsPortal => "news_portal",
            SiteType::Government => "government",
            SiteType::Blog => "blog",
            SiteType::ECommerce => "e_commerce",
            SiteType::Forum => "forum",
            SiteType::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mcq_platform" => Some(SiteType::McqPlatform),
            "exam_prep" => Some(SiteType::ExamPrep),
            "educational" => Some(SiteType::Educational),
            "news_portal" => Some(SiteType::NewsPortal),
            "government" => Some(SiteType::Government),
            "blog" => Some(SiteType::Blog),
            "e_commerce" => Some(SiteType::ECommerce),
            "forum" => Some(SiteType::Forum),
            "unknown" => Some(SiteType::Unknown),
            _ => None,
        }
    }
}

/// One catalogue entry: weighted keyword evidence plus weighted structural
/// evidence. Keywords are single tokens matched by prefix against the
/// summary's token table.
pub struct TypeProfile {
    pub site_type: SiteType,
    pub keywords: &'static [(&'static str, f64)],
    pub signals: &'static [(RegionKind, f64)],
}

impl TypeProfile {
    /// The raw score this profile would reach with every keyword at
    /// saturation and every structural signal present.
    pub fn max_score(&self) -> f64 {
        let keywords: f64 = self.keywords.iter().map(|(_, w)| w).sum();
        let signals: f64 = self.signals.iter().map(|(_, w)| w).sum();
        keywords + signals
    }

    pub fn for_type(site_type: SiteType) -> Option<&'static TypeProfile> {
        PROFILES.iter().find(|p| p.site_type == site_type)
    }
}

/// Static, process-wide catalogue. Declaration order is the final
/// classification tie-break, so the more specific types come first.
pub const PROFILES: &[TypeProfile] = &[
    TypeProfile {
        site_type: SiteType::McqPlatform,
        keywords: &[
            ("mcq", 3.0),
            ("quiz", 2.0),
            ("question", 1.5),
            ("answer", 1.0),
            ("choice", 1.0),
        ],
        signals: &[
            (RegionKind::ContentTable, 2.0),
            (RegionKind::CategoryList, 1.0),
            (RegionKind::Pagination, 0.5),
        ],
    },
    TypeProfile {
        site_type: SiteType::ExamPrep,
        keywords: &[
            ("exam", 2.5),
            ("past", 1.5),
            ("paper", 1.5),
            ("prep", 1.5),
            ("syllabus", 1.0),
            ("test", 1.0),
        ],
        signals: &[
            (RegionKind::CategoryList, 1.5),
            (RegionKind::ContentTable, 1.0),
            (RegionKind::Pagination, 0.5),
        ],
    },
    TypeProfile {
        site_type: SiteType::Educational,
        keywords: &[
            ("course", 2.0),
            ("lesson", 1.5),
            ("tutorial", 1.5),
            ("study", 1.0),
            ("learn", 1.0),
            ("subject", 1.0),
        ],
        signals: &[
            (RegionKind::CategoryList, 1.5),
            (RegionKind::NavSide, 0.5),
        ],
    },
    TypeProfile {
        site_type: SiteType::NewsPortal,
        keywords: &[
            ("news", 2.5),
            ("breaking", 1.5),
            ("headline", 1.5),
            ("latest", 1.0),
            ("article", 1.0),
        ],
        signals: &[
            (RegionKind::Pagination, 1.0),
            (RegionKind::NavTop, 1.0),
        ],
    },
    TypeProfile {
        site_type: SiteType::Government,
        keywords: &[
            ("government", 2.5),
            ("ministry", 1.5),
            ("official", 1.0),
            ("department", 1.0),
            ("public", 0.5),
        ],
        signals: &[
            (RegionKind::NavTop, 1.0),
            (RegionKind::SearchForm, 0.5),
        ],
    },
    TypeProfile {
        site_type: SiteType::Blog,
        keywords: &[
            ("blog", 2.5),
            ("post", 1.5),
            ("comment", 1.0),
            ("author", 1.0),
            ("archive", 1.0),
            ("tag", 0.5),
        ],
        signals: &[
            (RegionKind::Pagination, 1.5),
            (RegionKind::NavSide, 0.5),
        ],
    },
    TypeProfile {
        site_type: SiteType::ECommerce,
        keywords: &[
            ("shop", 2.0),
            ("cart", 2.0),
            ("price", 1.5),
            ("product", 1.5),
            ("buy", 1.0),
        ],
        signals: &[
            (RegionKind::SearchForm, 1.0),
            (RegionKind::CategoryList, 1.0),
            (RegionKind::Pagination, 0.5),
        ],
    },
    TypeProfile {
        site_type: SiteType::Forum,
        keywords: &[
            ("forum", 2.5),
            ("thread", 2.0),
            ("reply", 1.5),
            ("member", 1.0),
            ("discussion", 1.0),
        ],
        signals: &[
            (RegionKind::Pagination, 1.0),
            (RegionKind::SearchForm, 0.5),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_never_contains_unknown() {
        assert!(PROFILES.iter().all(|p| p.site_type != SiteType::Unknown));
    }

    #[test]
    fn every_profile_has_positive_max_score() {
        for profile in PROFILES {
            assert!(profile.max_score() > 0.0, "{}", profile.site_type.as_str());
        }
    }

    #[test]
    fn site_type_round_trips_through_str() {
        for profile in PROFILES {
            let s = profile.site_type.as_str();
            assert_eq!(SiteType::from_str(s), Some(profile.site_type));
        }
        assert_eq!(SiteType::from_str("unknown"), Some(SiteType::Unknown));
        assert_eq!(SiteType::from_str("garbage"), None);
    }

    #[test]
    fn lookup_by_type_finds_catalogue_entry() {
        let profile = TypeProfile::for_type(SiteType::McqPlatform).unwrap();
        assert!(profile.keywords.iter().any(|(k, _)| *k == "mcq"));
        assert!(TypeProfile::for_type(SiteType::Unknown).is_none());
    }
}
