use crate::error::{AnalyzeError, Result};
use crate::extract;
use crate::fetch::Fetch;
use crate::profiles::TypeProfile;
use crate::summary::{LinkCandidate, RegionKind, StructuralSummary};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Upper bound on pages fetched per recursion wave.
pub const DISCOVERY_FANOUT_LIMIT: usize = 10;
/// Upper bound on candidates returned from one discovery run.
pub const MAX_CANDIDATES: usize = 100;

/// Score weights; the three components each sit in [0, 1].
const ANCHOR_WEIGHT: f64 = 0.5;
const DEPTH_WEIGHT: f64 = 0.2;
const REGION_WEIGHT: f64 = 0.3;
/// Matched keyword weight at which the anchor component saturates.
const KEYWORD_OVERLAP_SATURATION: f64 = 3.0;
/// Paths deeper than this score zero on the depth component.
const PATH_DEPTH_CEILING: f64 = 6.0;
/// Region component per containing region.
const CONTENT_REGION_FACTOR: f64 = 1.0;
const NAV_REGION_FACTOR: f64 = 0.5;
const BODY_REGION_FACTOR: f64 = 0.2;
/// Synthesized next-page siblings inherit this fraction of the source score.
const NEXT_PAGE_SCORE_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlOrigin {
    SameDomain,
    CrossDomain,
}

impl UrlOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlOrigin::SameDomain => "same_domain",
            UrlOrigin::CrossDomain => "cross_domain",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "same_domain" => Some(UrlOrigin::SameDomain),
            "cross_domain" => Some(UrlOrigin::CrossDomain),
            _ => None,
        }
    }
}

/// One ranked content-bearing link. Unique by normalized URL within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateUrl {
    pub url: String,
    pub anchor_text: String,
    pub score: f64,
    pub origin: UrlOrigin,
}

#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    pub max_depth: usize,
    pub allowed_domains: Vec<String>,
    pub fanout_limit: usize,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            max_depth: 1,
            allowed_domains: Vec::new(),
            fanout_limit: DISCOVERY_FANOUT_LIMIT,
        }
    }
}

/// Walks the summary's link list, scoring and deduplicating candidates.
/// With `max_depth > 0`, the best same-domain candidates of each wave are
/// fetched and mined one level further; fetch or parse failures during
/// recursion skip that page rather than failing the run. `max_depth == 0`
/// performs no fetches at all.
pub async fn discover(
    summary: &StructuralSummary,
    source_url: &Url,
    profile: Option<&TypeProfile>,
    fetcher: &dyn Fetch,
    options: &DiscoverOptions,
    cancel: &CancellationToken,
) -> Result<Vec<CandidateUrl>> {
    let mut accumulated: Vec<CandidateUrl> = Vec::new();
    let mut index_by_url: HashMap<String, usize> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(normalize_url(source_url).to_string());

    merge(
        &mut accumulated,
        &mut index_by_url,
        first_pass(summary, source_url, profile, options),
    );

    let mut depth = options.max_depth;
    while depth > 0 {
        if cancel.is_cancelled() {
            return Err(AnalyzeError::Cancelled);
        }
        let frontier = next_frontier(&accumulated, &visited, options.fanout_limit);
        if frontier.is_empty() {
            break;
        }
        debug!("Discovery wave at depth {}: {} pages", depth, frontier.len());

        let pages = join_all(frontier.iter().map(|u| fetcher.fetch(u))).await;
        for (frontier_url, fetched) in frontier.iter().zip(pages) {
            visited.insert(frontier_url.clone());
            let page = match fetched {
                Ok(page) => page,
                Err(e) => {
                    warn!("Discovery fetch failed for {}: {}", frontier_url, e);
                    continue;
                }
            };
            let sub_summary = match extract::extract(&page.body) {
                Ok(s) => s,
                Err(_) => {
                    debug!("Skipping unparseable page {}", frontier_url);
                    continue;
                }
            };
            let base = match Url::parse(&page.url).or_else(|_| Url::parse(frontier_url)) {
                Ok(base) => base,
                Err(_) => continue,
            };
            // Same-origin rules stay anchored to the run's source URL.
            merge(
                &mut accumulated,
                &mut index_by_url,
                scored_links(&sub_summary, &base, source_url, profile, options),
            );
        }
        depth -= 1;
    }

    // Stable sort keeps first-discovered order for equal scores.
    accumulated.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    if accumulated.len() > MAX_CANDIDATES {
        debug!(
            "Truncating candidate list from {} to {}",
            accumulated.len(),
            MAX_CANDIDATES
        );
        accumulated.truncate(MAX_CANDIDATES);
    }
    Ok(accumulated)
}

fn first_pass(
    summary: &StructuralSummary,
    source_url: &Url,
    profile: Option<&TypeProfile>,
    options: &DiscoverOptions,
) -> Vec<CandidateUrl> {
    scored_links(summary, source_url, source_url, profile, options)
}

fn scored_links(
    summary: &StructuralSummary,
    base: &Url,
    source_url: &Url,
    profile: Option<&TypeProfile>,
    options: &DiscoverOptions,
) -> Vec<CandidateUrl> {
    let mut out = Vec::new();
    for link in &summary.links {
        let Some(resolved) = resolve_href(base, &link.href) else {
            continue;
        };
        let Some(origin) = classify_origin(&resolved, source_url, &options.allowed_domains) else {
            continue;
        };
        let score = score_candidate(link, &resolved, profile);
        let candidate = CandidateUrl {
            url: resolved.to_string(),
            anchor_text: link.anchor_text.clone(),
            score,
            origin,
        };
        if let Some(next) = next_page_sibling(&resolved) {
            out.push(CandidateUrl {
                url: next.to_string(),
                anchor_text: link.anchor_text.clone(),
                score: score * NEXT_PAGE_SCORE_FACTOR,
                origin,
            });
        }
        out.push(candidate);
    }
    out
}

/// Resolves an href against its page, dropping non-content schemes, bare
/// fragments, and fragments/trailing slashes from the result.
fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let resolved = base.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    Some(normalize_url(&resolved))
}

fn normalize_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }
    url
}

fn classify_origin(url: &Url, source_url: &Url, allowed: &[String]) -> Option<UrlOrigin> {
    let host = url.host_str()?;
    let source_host = source_url.host_str()?;
    if host == source_host || host.ends_with(&format!(".{}", source_host)) {
        return Some(UrlOrigin::SameDomain);
    }
    if allowed.iter().any(|d| d == host) {
        return Some(UrlOrigin::CrossDomain);
    }
    None
}

fn score_candidate(link: &LinkCandidate, url: &Url, profile: Option<&TypeProfile>) -> f64 {
    let anchor = anchor_component(link, url, profile);
    let depth = depth_component(url);
    let region = region_component(link.region);
    ANCHOR_WEIGHT * anchor + DEPTH_WEIGHT * depth + REGION_WEIGHT * region
}

/// Overlap between the anchor text (and URL path) and the detected
/// profile's keywords, saturating at [`KEYWORD_OVERLAP_SATURATION`].
fn anchor_component(link: &LinkCandidate, url: &Url, profile: Option<&TypeProfile>) -> f64 {
    let Some(profile) = profile else {
        return 0.0;
    };
    let anchor_tokens: Vec<String> = extract::tokenize(&link.anchor_text).collect();
    let path = url.path().to_lowercase();

    let mut matched = 0.0;
    for &(keyword, weight) in profile.keywords {
        if anchor_tokens.iter().any(|t| t.starts_with(keyword)) || path.contains(keyword) {
            matched += weight;
        }
    }
    (matched / KEYWORD_OVERLAP_SATURATION).min(1.0)
}

/// Shallower paths score higher, favoring index and listing pages.
fn depth_component(url: &Url) -> f64 {
    let segments = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).count())
        .unwrap_or(0) as f64;
    1.0 - segments.min(PATH_DEPTH_CEILING) / PATH_DEPTH_CEILING
}

fn region_component(region: Option<RegionKind>) -> f64 {
    match region {
        Some(RegionKind::CategoryList) | Some(RegionKind::ContentTable) => CONTENT_REGION_FACTOR,
        Some(_) => NAV_REGION_FACTOR,
        None => BODY_REGION_FACTOR,
    }
}

/// A numeric `page` query parameter points at a browsable sequence; guess
/// its next page as a lower-scored sibling.
fn next_page_sibling(url: &Url) -> Option<Url> {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let page: u64 = pairs
        .iter()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())?;

    let mut next = url.clone();
    next.query_pairs_mut()
        .clear()
        .extend_pairs(pairs.iter().map(|(k, v)| {
            if k == "page" {
                (k.clone(), (page + 1).to_string())
            } else {
                (k.clone(), v.clone())
            }
        }));
    Some(next)
}

/// Dedup by normalized URL, keeping the highest score seen and the
/// first-seen position, anchor, and origin.
fn merge(
    accumulated: &mut Vec<CandidateUrl>,
    index_by_url: &mut HashMap<String, usize>,
    incoming: Vec<CandidateUrl>,
) {
    for candidate in incoming {
        match index_by_url.get(&candidate.url) {
            Some(&i) => {
                if candidate.score > accumulated[i].score {
                    accumulated[i].score = candidate.score;
                }
            }
            None => {
                index_by_url.insert(candidate.url.clone(), accumulated.len());
                accumulated.push(candidate);
            }
        }
    }
}

/// Best same-domain candidates not yet fetched, in rank order.
fn next_frontier(
    accumulated: &[CandidateUrl],
    visited: &HashSet<String>,
    fanout_limit: usize,
) -> Vec<String> {
    let mut ranked: Vec<&CandidateUrl> = accumulated
        .iter()
        .filter(|c| c.origin == UrlOrigin::SameDomain && !visited.contains(&c.url))
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().take(fanout_limit).map(|c| c.url.clone()).collect()
}
