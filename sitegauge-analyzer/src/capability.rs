use crate::extract::{CATEGORY_VOCAB, is_numeric_anchor, is_pagination_anchor, tokenize};
use crate::summary::{RegionKind, StructuralSummary};
use std::collections::BTreeMap;

const NAV_MIN_LINKS: usize = 3;
const CATEGORY_MIN_LINKS: usize = 5;
const TABLE_MIN_LINKS: usize = 3;
/// Navigation anchors are short labels; content rows carry longer titles.
const NAV_ANCHOR_MAX_TOKENS: f64 = 4.0;
const CONTENT_ANCHOR_MIN_TOKENS: f64 = 3.0;
const PAGINATION_MIN_NUMERIC: usize = 3;

/// Scores every capability independently. Confidence per capability is the
/// fraction of its positive signals out of the signals checked, so partial
/// evidence degrades the score instead of dropping the capability.
pub fn detect(summary: &StructuralSummary) -> BTreeMap<RegionKind, f64> {
    let mut capabilities = BTreeMap::new();
    for kind in RegionKind::ALL {
        let signals = signals_for(kind, summary);
        let positives = signals.iter().filter(|s| **s).count();
        capabilities.insert(kind, positives as f64 / signals.len() as f64);
    }
    capabilities
}

fn signals_for(kind: RegionKind, summary: &StructuralSummary) -> Vec<bool> {
    let region_present = summary.regions.contains(&kind);
    match kind {
        RegionKind::NavTop => vec![
            region_present,
            summary.links_in(RegionKind::NavTop).count() >= NAV_MIN_LINKS,
            anchors_are_short(summary, RegionKind::NavTop),
        ],
        RegionKind::NavSide => vec![
            region_present,
            summary.links_in(RegionKind::NavSide).count() >= NAV_MIN_LINKS,
        ],
        RegionKind::Pagination => vec![
            region_present,
            summary
                .links
                .iter()
                .any(|l| is_pagination_anchor(&l.anchor_text)),
            summary
                .links
                .iter()
                .filter(|l| is_numeric_anchor(&l.anchor_text))
                .count()
                >= PAGINATION_MIN_NUMERIC,
            summary.links.iter().any(|l| has_page_marker(&l.href)),
        ],
        RegionKind::SearchForm => vec![
            region_present,
            summary.token_counts.contains_key("search"),
            summary.links.iter().any(|l| {
                let href = l.href.to_lowercase();
                href.contains("search") || href.contains("?s=") || href.contains("?q=")
            }),
        ],
        RegionKind::CategoryList => vec![
            region_present,
            summary.links_in(RegionKind::CategoryList).count() >= CATEGORY_MIN_LINKS,
            summary.links.iter().any(|l| {
                tokenize(&l.anchor_text).any(|t| CATEGORY_VOCAB.contains(&t.as_str()))
            }),
        ],
        RegionKind::ContentTable => vec![
            region_present,
            summary.links_in(RegionKind::ContentTable).count() >= TABLE_MIN_LINKS,
            mean_anchor_tokens(summary, RegionKind::ContentTable) >= CONTENT_ANCHOR_MIN_TOKENS,
        ],
    }
}

fn has_page_marker(href: &str) -> bool {
    let href = href.to_lowercase();
    href.contains("page=") || href.contains("/page/") || href.contains("?p=")
}

fn mean_anchor_tokens(summary: &StructuralSummary, region: RegionKind) -> f64 {
    let mut links = 0usize;
    let mut tokens = 0usize;
    for link in summary.links_in(region) {
        links += 1;
        tokens += link.anchor_text.split_whitespace().count();
    }
    if links == 0 {
        return 0.0;
    }
    tokens as f64 / links as f64
}

fn anchors_are_short(summary: &StructuralSummary, region: RegionKind) -> bool {
    let mean = mean_anchor_tokens(summary, region);
    mean > 0.0 && mean <= NAV_ANCHOR_MAX_TOKENS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    #[test]
    fn every_capability_is_reported_and_bounded() {
        let summary = StructuralSummary::empty();
        let capabilities = detect(&summary);
        assert_eq!(capabilities.len(), RegionKind::ALL.len());
        for confidence in capabilities.values() {
            assert!((0.0..=1.0).contains(confidence));
        }
    }

    #[test]
    fn next_previous_anchors_score_at_least_half_for_pagination() {
        let html = r#"<html><body>
            <a href="/list?page=1">previous page</a>
            <a href="/list?page=3">next page</a>
        </body></html>"#;
        let capabilities = detect(&extract(html).unwrap());
        assert!(capabilities[&RegionKind::Pagination] >= 0.5);
    }

    #[test]
    fn pagination_confidence_grows_with_evidence() {
        let sparse = extract(r#"<html><body><a href="/b">next</a></body></html>"#).unwrap();
        let rich = extract(
            r#"<html><body>
                <a href="/list?page=1">1</a>
                <a href="/list?page=2">2</a>
                <a href="/list?page=3">3</a>
                <a href="/list?page=4">next</a>
            </body></html>"#,
        )
        .unwrap();
        let sparse_caps = detect(&sparse);
        let rich_caps = detect(&rich);
        assert!(rich_caps[&RegionKind::Pagination] > sparse_caps[&RegionKind::Pagination]);
        assert_eq!(rich_caps[&RegionKind::Pagination], 1.0);
    }

    #[test]
    fn top_nav_scores_full_on_clean_menu() {
        let html = r#"<html><body>
            <nav><a href="/">Home</a><a href="/mcqs">MCQs</a><a href="/papers">Papers</a><a href="/contact">Contact</a></nav>
        </body></html>"#;
        let capabilities = detect(&extract(html).unwrap());
        assert_eq!(capabilities[&RegionKind::NavTop], 1.0);
    }

    #[test]
    fn capabilities_are_independent_of_site_type() {
        // A blog-looking page still reports pagination on its own merits.
        let html = r#"<html><body>
            <p>blog post by an author with comments</p>
            <a href="/blog?page=1">1</a>
            <a href="/blog?page=2">2</a>
            <a href="/blog?page=3">3</a>
            <a href="/blog?page=4">next</a>
        </body></html>"#;
        let capabilities = detect(&extract(html).unwrap());
        assert_eq!(capabilities[&RegionKind::Pagination], 1.0);
        assert_eq!(capabilities[&RegionKind::ContentTable], 0.0);
    }

    #[test]
    fn content_table_scores_on_repeated_titled_rows() {
        let html = r#"<html><body><table>
            <tr><td><a href="/p1">PPSC Assistant Past Paper 2021</a></td></tr>
            <tr><td><a href="/p2">PPSC Assistant Past Paper 2022</a></td></tr>
            <tr><td><a href="/p3">PPSC Assistant Past Paper 2023</a></td></tr>
        </table></body></html>"#;
        let capabilities = detect(&extract(html).unwrap());
        assert_eq!(capabilities[&RegionKind::ContentTable], 1.0);
    }
}
