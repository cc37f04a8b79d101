use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Structural regions a page can expose. Detected per page by the signal
/// extractor; also the keys of the capability map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionKind {
    NavTop,
    NavSide,
    Pagination,
    SearchForm,
    CategoryList,
    ContentTable,
}

impl RegionKind {
    pub const ALL: [RegionKind; 6] = [
        RegionKind::NavTop,
        RegionKind::NavSide,
        RegionKind::Pagination,
        RegionKind::SearchForm,
        RegionKind::CategoryList,
        RegionKind::ContentTable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::NavTop => "nav_top",
            RegionKind::NavSide => "nav_side",
            RegionKind::Pagination => "pagination",
            RegionKind::SearchForm => "search_form",
            RegionKind::CategoryList => "category_list",
            RegionKind::ContentTable => "content_table",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "nav_top" => Some(RegionKind::NavTop),
            "nav_side" => Some(RegionKind::NavSide),
            "pagination" => Some(RegionKind::Pagination),
            "search_form" => Some(RegionKind::SearchForm),
            "category_list" => Some(RegionKind::CategoryList),
            "content_table" => Some(RegionKind::ContentTable),
            _ => None,
        }
    }
}

/// One anchor found on the page, in document order, with the region the
/// extractor assigned it to (if any).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCandidate {
    pub href: String,
    pub anchor_text: String,
    pub region: Option<RegionKind>,
}

/// Normalized structural view of one fetched page. Immutable once built;
/// owned by the pipeline invocation that produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuralSummary {
    pub token_counts: HashMap<String, usize>,
    pub links: Vec<LinkCandidate>,
    pub regions: HashSet<RegionKind>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub text_len: usize,
}

impl StructuralSummary {
    /// A summary carrying no signal at all; classification of it is Unknown.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.token_counts.is_empty() && self.links.is_empty() && self.regions.is_empty()
    }

    /// Total occurrences of tokens starting with the given keyword, so
    /// "mcq" also counts "mcqs" and "paper" counts "papers".
    pub fn keyword_count(&self, keyword: &str) -> usize {
        self.token_counts
            .iter()
            .filter(|(token, _)| token.starts_with(keyword))
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn links_in(&self, region: RegionKind) -> impl Iterator<Item = &LinkCandidate> {
        self.links.iter().filter(move |l| l.region == Some(region))
    }
}
