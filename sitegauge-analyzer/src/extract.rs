use crate::error::{AnalyzeError, Result};
use crate::summary::{LinkCandidate, RegionKind, StructuralSummary};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use url::Url;

/// Minimum links a list element must hold to count as a navigation group.
const NAV_GROUP_MIN_LINKS: usize = 3;
/// Minimum links for a group to qualify as a category listing.
const CATEGORY_GROUP_MIN_LINKS: usize = 5;
/// Share of group links that must share a leading path segment for the
/// group to read as a category listing.
const CATEGORY_PATH_SHARE: f64 = 0.7;
/// Minimum link-bearing rows before a table counts as a content table.
const CONTENT_TABLE_MIN_ROWS: usize = 3;
/// How many trailing links are examined for pagination controls.
const PAGINATION_TAIL_WINDOW: usize = 12;
/// Numeric anchors required in the tail window to read as page numbers.
const PAGINATION_MIN_NUMERIC: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "were", "this", "that", "with", "from",
    "you", "your", "our", "has", "have", "had", "not", "but", "all", "can",
    "will", "its", "his", "her", "they", "them", "their", "been", "more",
    "about", "into", "also", "other", "when", "what", "which", "who", "how",
];

pub(crate) const CATEGORY_VOCAB: &[&str] = &[
    "category", "categories", "subject", "subjects", "topic", "topics",
    "chapter", "chapters", "section", "class", "mcqs", "papers",
];

const PAGINATION_MARKERS: &[&str] = &["next", "prev", "previous", "older", "newer"];

/// Parses markup into a [`StructuralSummary`]. Fails only when the input
/// cannot be treated as a document at all; unexpected structure yields a
/// partial (possibly empty) summary instead.
pub fn extract(markup: &str) -> Result<StructuralSummary> {
    if markup.trim().is_empty() || !markup.contains('<') {
        return Err(AnalyzeError::MalformedInput);
    }

    let doc = Html::parse_document(markup);

    let text = visible_text(&doc);
    let token_counts = count_tokens(&text);

    let mut regions = HashSet::new();
    let region_by_node = assign_link_regions(&doc, &mut regions);

    let link_sel = Selector::parse("a[href]").unwrap();
    let mut links = Vec::new();
    for element in doc.select(&link_sel) {
        if let Some(href) = element.value().attr("href") {
            links.push(LinkCandidate {
                href: href.to_string(),
                anchor_text: collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")),
                region: region_by_node.get(&element.id()).copied(),
            });
        }
    }

    mark_pagination_tail(&mut links, &mut regions);

    if has_search_form(&doc) {
        regions.insert(RegionKind::SearchForm);
    }

    let summary = StructuralSummary {
        token_counts,
        links,
        regions,
        title: extract_title(&doc),
        description: extract_description(&doc),
        text_len: text.len(),
    };
    debug!(
        "Extracted {} links, {} regions, {} distinct tokens",
        summary.links.len(),
        summary.regions.len(),
        summary.token_counts.len()
    );
    Ok(summary)
}

/// Lower-cased alphanumeric tokens of at least two characters.
pub(crate) fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 2)
        .map(|w| w.to_lowercase())
}

fn count_tokens(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        if STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

pub(crate) fn is_pagination_anchor(text: &str) -> bool {
    let lowered = text.to_lowercase();
    if matches!(lowered.trim(), "»" | "«" | "→" | "←" | ">>" | "<<") {
        return true;
    }
    tokenize(&lowered).any(|t| PAGINATION_MARKERS.contains(&t.as_str()))
}

pub(crate) fn is_numeric_anchor(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Gathers the document's rendered text, skipping script/style payloads.
fn visible_text(doc: &Html) -> String {
    let mut out = String::new();
    for node in doc.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| {
                    matches!(e.name(), "script" | "style" | "noscript" | "template")
                }))
                .unwrap_or(false);
            if !hidden {
                out.push_str(text);
                out.push(' ');
            }
        }
    }
    out
}

/// Walks list-like elements and tables in document order, assigning a region
/// to every link they contain. The first qualifying non-aside group becomes
/// the top navigation; later groups are sidebars or category listings
/// depending on placement and vocabulary. Tables with repeated link-bearing
/// rows win over list groups for the links they contain.
fn assign_link_regions(
    doc: &Html,
    regions: &mut HashSet<RegionKind>,
) -> HashMap<NodeId, RegionKind> {
    let link_sel = Selector::parse("a[href]").unwrap();
    let group_sel = Selector::parse("nav, ul, ol").unwrap();
    let table_sel = Selector::parse("table").unwrap();
    let row_sel = Selector::parse("tr").unwrap();

    let mut region_by_node = HashMap::new();
    let mut taken = HashSet::new();
    let mut have_top = false;

    for group in doc.select(&group_sel) {
        if group.ancestors().any(|a| taken.contains(&a.id())) {
            continue;
        }
        let group_links: Vec<ElementRef> = group.select(&link_sel).collect();
        if group_links.len() < NAV_GROUP_MIN_LINKS {
            continue;
        }
        taken.insert(group.id());

        let kind = if is_aside_positioned(&group) {
            if is_category_group(&group_links) {
                RegionKind::CategoryList
            } else {
                RegionKind::NavSide
            }
        } else if !have_top {
            have_top = true;
            RegionKind::NavTop
        } else if is_category_group(&group_links) {
            RegionKind::CategoryList
        } else {
            RegionKind::NavSide
        };

        regions.insert(kind);
        for link in &group_links {
            region_by_node.insert(link.id(), kind);
        }
    }

    for table in doc.select(&table_sel) {
        let link_rows = table
            .select(&row_sel)
            .filter(|row| row.select(&link_sel).next().is_some())
            .count();
        if link_rows >= CONTENT_TABLE_MIN_ROWS {
            regions.insert(RegionKind::ContentTable);
            for link in table.select(&link_sel) {
                region_by_node.insert(link.id(), RegionKind::ContentTable);
            }
        }
    }

    region_by_node
}

fn is_aside_positioned(group: &ElementRef) -> bool {
    let sidebar_class = |el: &ElementRef| {
        el.value()
            .attr("class")
            .map(|c| {
                let c = c.to_lowercase();
                c.contains("side") || c.contains("widget")
            })
            .unwrap_or(false)
    };
    if group.value().name() == "aside" || sidebar_class(group) {
        return true;
    }
    group
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "aside" || sidebar_class(&a))
}

fn is_category_group(links: &[ElementRef]) -> bool {
    if links.len() < CATEGORY_GROUP_MIN_LINKS {
        return false;
    }

    let vocab_hit = links.iter().any(|link| {
        let anchor = link.text().collect::<Vec<_>>().join(" ");
        tokenize(&anchor).any(|t| CATEGORY_VOCAB.contains(&t.as_str()))
    });
    if vocab_hit {
        return true;
    }

    // Category listings tend to fan out under one path segment.
    let mut segment_counts: HashMap<String, usize> = HashMap::new();
    let mut segmented = 0usize;
    for link in links {
        if let Some(href) = link.value().attr("href")
            && let Some(segment) = first_path_segment(href)
        {
            segmented += 1;
            *segment_counts.entry(segment).or_insert(0) += 1;
        }
    }
    if segmented < CATEGORY_GROUP_MIN_LINKS {
        return false;
    }
    segment_counts
        .values()
        .max()
        .map(|&max| max as f64 / segmented as f64 >= CATEGORY_PATH_SHARE)
        .unwrap_or(false)
}

fn first_path_segment(href: &str) -> Option<String> {
    let path = match Url::parse(href) {
        Ok(u) => u.path().to_string(),
        Err(_) => href.split(['?', '#']).next().unwrap_or("").to_string(),
    };
    path.trim_matches('/')
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
}

/// Pagination controls live at the end of the link list: next/previous
/// anchors, or a run of bare page numbers.
fn mark_pagination_tail(links: &mut [LinkCandidate], regions: &mut HashSet<RegionKind>) {
    let start = links.len().saturating_sub(PAGINATION_TAIL_WINDOW);
    let numeric_count = links[start..]
        .iter()
        .filter(|l| is_numeric_anchor(&l.anchor_text))
        .count();

    let mut hit = false;
    for link in &mut links[start..] {
        let marker = is_pagination_anchor(&link.anchor_text);
        let numbered = numeric_count >= PAGINATION_MIN_NUMERIC && is_numeric_anchor(&link.anchor_text);
        if marker || numbered {
            link.region = Some(RegionKind::Pagination);
            hit = true;
        }
    }
    if hit {
        regions.insert(RegionKind::Pagination);
    }
}

fn has_search_form(doc: &Html) -> bool {
    let search_input_sel = Selector::parse(r#"input[type="search"]"#).unwrap();
    if doc.select(&search_input_sel).next().is_some() {
        return true;
    }

    let form_sel = Selector::parse("form").unwrap();
    let input_sel = Selector::parse("input").unwrap();
    let searchy = |value: Option<&str>| {
        value
            .map(|v| {
                let v = v.to_lowercase();
                v.contains("search") || v.contains("query")
            })
            .unwrap_or(false)
    };
    for form in doc.select(&form_sel) {
        let el = form.value();
        if searchy(el.attr("class")) || searchy(el.attr("id")) || searchy(el.attr("action")) {
            return true;
        }
        for input in form.select(&input_sel) {
            let iv = input.value();
            if searchy(iv.attr("name"))
                || searchy(iv.attr("id"))
                || searchy(iv.attr("placeholder"))
                || matches!(iv.attr("name"), Some("q") | Some("s"))
            {
                return true;
            }
        }
    }
    false
}

const TITLE_SUFFIXES: &[&str] = &[" - Home", " | Home", " - Official Site", " - Official Website"];

fn extract_title(doc: &Html) -> Option<String> {
    let title_sel = Selector::parse("title").unwrap();
    if let Some(el) = doc.select(&title_sel).next() {
        let mut title = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
        for suffix in TITLE_SUFFIXES {
            if let Some(stripped) = title.strip_suffix(suffix) {
                title = stripped.to_string();
            }
        }
        if !title.is_empty() && title.len() < 100 {
            return Some(title);
        }
    }

    let og_sel = Selector::parse(r#"meta[property="og:site_name"]"#).unwrap();
    doc.select(&og_sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn extract_description(doc: &Html) -> Option<String> {
    let meta_candidates = [
        r#"meta[name="description"]"#,
        r#"meta[property="og:description"]"#,
    ];
    for selector in meta_candidates {
        let sel = Selector::parse(selector).unwrap();
        if let Some(content) = doc
            .select(&sel)
            .next()
            .and_then(|el| el.value().attr("content"))
        {
            let content = content.trim();
            if content.len() > 20 && content.len() < 300 {
                return Some(content.to_string());
            }
        }
    }

    let p_sel = Selector::parse("p").unwrap();
    for p in doc.select(&p_sel).take(5) {
        let text = collapse_whitespace(&p.text().collect::<Vec<_>>().join(" "));
        if text.len() > 50 && text.len() < 300 {
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_malformed() {
        assert!(matches!(extract(""), Err(AnalyzeError::MalformedInput)));
        assert!(matches!(extract("   \n "), Err(AnalyzeError::MalformedInput)));
    }

    #[test]
    fn markup_free_input_is_malformed() {
        assert!(matches!(
            extract("just some plain text"),
            Err(AnalyzeError::MalformedInput)
        ));
    }

    #[test]
    fn unexpected_structure_degrades_not_errors() {
        let summary = extract("<html><body><p>hi there world</p></body></html>").unwrap();
        assert!(summary.links.is_empty());
        assert!(summary.regions.is_empty());
        assert!(summary.token_counts.contains_key("world"));
    }

    #[test]
    fn tokenization_skips_stop_words_and_counts() {
        let summary = extract("<p>The quiz and the quiz for the Quiz</p>").unwrap();
        assert_eq!(summary.token_counts.get("quiz"), Some(&3));
        assert!(!summary.token_counts.contains_key("the"));
        assert!(!summary.token_counts.contains_key("and"));
    }

    #[test]
    fn keyword_count_matches_by_prefix() {
        let summary = extract("<p>mcq mcqs paper papers</p>").unwrap();
        assert_eq!(summary.keyword_count("mcq"), 2);
        assert_eq!(summary.keyword_count("paper"), 2);
    }

    #[test]
    fn first_link_group_is_top_nav_later_groups_are_side() {
        let html = r#"<html><body>
            <ul><li><a href="/a">Home</a></li><li><a href="/b">News</a></li><li><a href="/c">Contact</a></li></ul>
            <ul><li><a href="/d">One</a></li><li><a href="/e">Two</a></li><li><a href="/f">Three</a></li></ul>
        </body></html>"#;
        let summary = extract(html).unwrap();
        assert!(summary.regions.contains(&RegionKind::NavTop));
        assert!(summary.regions.contains(&RegionKind::NavSide));
        assert_eq!(summary.links_in(RegionKind::NavTop).count(), 3);
        assert_eq!(summary.links_in(RegionKind::NavSide).count(), 3);
    }

    #[test]
    fn aside_group_is_side_nav_even_when_first() {
        let html = r#"<html><body>
            <aside><ul>
                <li><a href="/a">One</a></li><li><a href="/b">Two</a></li><li><a href="/c">Three</a></li>
            </ul></aside>
        </body></html>"#;
        let summary = extract(html).unwrap();
        assert!(summary.regions.contains(&RegionKind::NavSide));
        assert!(!summary.regions.contains(&RegionKind::NavTop));
    }

    #[test]
    fn category_vocabulary_marks_category_list() {
        let html = r#"<html><body>
            <nav><a href="/1">A</a><a href="/2">B</a><a href="/3">C</a></nav>
            <aside><ul>
                <li><a href="/biology">Biology Subject</a></li>
                <li><a href="/physics">Physics Subject</a></li>
                <li><a href="/chemistry">Chemistry Subject</a></li>
                <li><a href="/english">English Subject</a></li>
                <li><a href="/math">Math Subject</a></li>
            </ul></aside>
        </body></html>"#;
        let summary = extract(html).unwrap();
        assert!(summary.regions.contains(&RegionKind::CategoryList));
        assert_eq!(summary.links_in(RegionKind::CategoryList).count(), 5);
    }

    #[test]
    fn shared_path_segment_marks_category_list() {
        let html = r#"<html><body>
            <nav><a href="/1">A</a><a href="/2">B</a><a href="/3">C</a></nav>
            <ul>
                <li><a href="/mcq/biology">Biology</a></li>
                <li><a href="/mcq/physics">Physics</a></li>
                <li><a href="/mcq/chemistry">Chemistry</a></li>
                <li><a href="/mcq/english">English</a></li>
                <li><a href="/mcq/math">Math</a></li>
            </ul>
        </body></html>"#;
        let summary = extract(html).unwrap();
        assert!(summary.regions.contains(&RegionKind::CategoryList));
    }

    #[test]
    fn repeated_link_rows_mark_content_table() {
        let html = r#"<html><body><table>
            <tr><td><a href="/p1">Paper One</a></td></tr>
            <tr><td><a href="/p2">Paper Two</a></td></tr>
            <tr><td><a href="/p3">Paper Three</a></td></tr>
        </table></body></html>"#;
        let summary = extract(html).unwrap();
        assert!(summary.regions.contains(&RegionKind::ContentTable));
        assert_eq!(summary.links_in(RegionKind::ContentTable).count(), 3);
    }

    #[test]
    fn next_previous_anchors_mark_pagination() {
        let html = r#"<html><body>
            <a href="/page/1">previous page</a>
            <a href="/page/3">next page</a>
        </body></html>"#;
        let summary = extract(html).unwrap();
        assert!(summary.regions.contains(&RegionKind::Pagination));
        assert_eq!(summary.links_in(RegionKind::Pagination).count(), 2);
    }

    #[test]
    fn numeric_run_marks_pagination() {
        let html = r#"<html><body>
            <a href="/?page=1">1</a><a href="/?page=2">2</a><a href="/?page=3">3</a>
        </body></html>"#;
        let summary = extract(html).unwrap();
        assert!(summary.regions.contains(&RegionKind::Pagination));
    }

    #[test]
    fn lone_number_is_not_pagination() {
        let html = r#"<html><body><a href="/x">7</a><a href="/y">about us</a></body></html>"#;
        let summary = extract(html).unwrap();
        assert!(!summary.regions.contains(&RegionKind::Pagination));
    }

    #[test]
    fn search_form_detected_by_input_type() {
        let html = r#"<html><body><form><input type="search" name="term"></form></body></html>"#;
        let summary = extract(html).unwrap();
        assert!(summary.regions.contains(&RegionKind::SearchForm));
    }

    #[test]
    fn search_form_detected_by_input_name() {
        let html = r#"<html><body><form action="/find"><input type="text" name="q"></form></body></html>"#;
        let summary = extract(html).unwrap();
        assert!(summary.regions.contains(&RegionKind::SearchForm));
    }

    #[test]
    fn title_suffix_is_stripped() {
        let html = "<html><head><title>PakExams - Home</title></head><body></body></html>";
        let summary = extract(html).unwrap();
        assert_eq!(summary.title.as_deref(), Some("PakExams"));
    }

    #[test]
    fn og_site_name_is_title_fallback() {
        let html = r#"<html><head><meta property="og:site_name" content="Quiz Hub"></head><body></body></html>"#;
        let summary = extract(html).unwrap();
        assert_eq!(summary.title.as_deref(), Some("Quiz Hub"));
    }

    #[test]
    fn meta_description_is_preferred() {
        let html = r#"<html><head>
            <meta name="description" content="Thousands of solved practice questions for exam preparation.">
        </head><body><p>short</p></body></html>"#;
        let summary = extract(html).unwrap();
        assert_eq!(
            summary.description.as_deref(),
            Some("Thousands of solved practice questions for exam preparation.")
        );
    }

    #[test]
    fn extraction_is_deterministic() {
        let html = r#"<html><body>
            <nav><a href="/a">A</a><a href="/b">B</a><a href="/c">C</a></nav>
            <p>quiz quiz mcq</p>
        </body></html>"#;
        let first = extract(html).unwrap();
        let second = extract(html).unwrap();
        assert_eq!(first.token_counts, second.token_counts);
        assert_eq!(first.regions, second.regions);
        assert_eq!(first.links.len(), second.links.len());
    }
}
