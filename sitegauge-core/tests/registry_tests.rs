// Tests for the website registry

use sitegauge_analyzer::config::{DetectionResult, SiteConfiguration, synthesize};
use sitegauge_analyzer::discover::{CandidateUrl, UrlOrigin};
use sitegauge_analyzer::profiles::SiteType;
use sitegauge_analyzer::summary::RegionKind;
use sitegauge_core::registry::Registry;
use tempfile::TempDir;

fn create_test_registry() -> (TempDir, Registry) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let registry = Registry::new(&db_path).unwrap();
    (temp_dir, registry)
}

fn sample_configuration(source_url: &str) -> SiteConfiguration {
    let detection = DetectionResult {
        site_type: SiteType::McqPlatform,
        confidence: 0.92,
        capabilities: [
            (RegionKind::NavTop, 1.0),
            (RegionKind::CategoryList, 0.66),
            (RegionKind::Pagination, 0.25),
        ]
        .into_iter()
        .collect(),
    };
    let candidates = vec![
        CandidateUrl {
            url: format!("{}/mcqs", source_url),
            anchor_text: "MCQs".to_string(),
            score: 0.9,
            origin: UrlOrigin::SameDomain,
        },
        CandidateUrl {
            url: format!("{}/papers", source_url),
            anchor_text: "Papers".to_string(),
            score: 0.6,
            origin: UrlOrigin::SameDomain,
        },
    ];
    synthesize(
        source_url,
        Some("Test Site".to_string()),
        Some("A test site".to_string()),
        detection,
        candidates,
    )
}

// ============================================================================
// Registry Creation Tests
// ============================================================================

#[test]
fn test_registry_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let registry = Registry::new(&db_path);
    assert!(registry.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_registry_exists() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    assert!(!Registry::exists(&db_path));

    let _registry = Registry::new(&db_path).unwrap();
    assert!(Registry::exists(&db_path));
}

#[test]
fn test_registry_drop() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let _registry = Registry::new(&db_path).unwrap();
    assert!(Registry::exists(&db_path));

    Registry::drop(&db_path);
    assert!(!Registry::exists(&db_path));
}

// ============================================================================
// Save / Lookup Tests
// ============================================================================

#[test]
fn test_save_and_find_configuration() {
    let (_tmp, mut registry) = create_test_registry();
    let config = sample_configuration("https://example.com");

    let id = registry.save_configuration(&config).unwrap();

    let record = registry
        .find_by_url("https://example.com")
        .unwrap()
        .expect("website should be stored");
    assert_eq!(record.id, id);
    assert_eq!(record.name.as_deref(), Some("Test Site"));
    assert_eq!(record.domain, "example.com");
    assert_eq!(record.site_type, SiteType::McqPlatform);
    assert!((record.confidence - 0.92).abs() < 1e-9);
}

#[test]
fn test_find_missing_website_is_none() {
    let (_tmp, registry) = create_test_registry();
    assert!(registry.find_by_url("https://nowhere.example").unwrap().is_none());
}

#[test]
fn test_candidates_round_trip_in_rank_order() {
    let (_tmp, mut registry) = create_test_registry();
    let config = sample_configuration("https://example.com");
    let id = registry.save_configuration(&config).unwrap();

    let candidates = registry.candidates_for(&id).unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].rank, 0);
    assert_eq!(candidates[0].url, "https://example.com/mcqs");
    assert_eq!(candidates[0].origin, UrlOrigin::SameDomain);
    assert_eq!(candidates[1].url, "https://example.com/papers");
    assert!(candidates[0].score > candidates[1].score);
}

#[test]
fn test_capabilities_round_trip_with_flags() {
    let (_tmp, mut registry) = create_test_registry();
    let config = sample_configuration("https://example.com");
    let id = registry.save_configuration(&config).unwrap();

    let capabilities = registry.capabilities_for(&id).unwrap();
    assert_eq!(capabilities.len(), config.detection.capabilities.len());

    let nav_top = capabilities
        .iter()
        .find(|c| c.kind == RegionKind::NavTop)
        .unwrap();
    assert!(nav_top.enabled);

    let pagination = capabilities
        .iter()
        .find(|c| c.kind == RegionKind::Pagination)
        .unwrap();
    assert!(!pagination.enabled);
}

#[test]
fn test_reanalysis_replaces_previous_rows() {
    let (_tmp, mut registry) = create_test_registry();
    let first = sample_configuration("https://example.com");
    let first_id = registry.save_configuration(&first).unwrap();

    let mut second = sample_configuration("https://example.com");
    second.candidates.truncate(1);
    second.detection.confidence = 0.5;
    let second_id = registry.save_configuration(&second).unwrap();

    // Same site keeps its identity across re-analysis.
    assert_eq!(first_id, second_id);

    let record = registry.find_by_url("https://example.com").unwrap().unwrap();
    assert!((record.confidence - 0.5).abs() < 1e-9);

    let candidates = registry.candidates_for(&second_id).unwrap();
    assert_eq!(candidates.len(), 1);
}

#[test]
fn test_list_websites_returns_all() {
    let (_tmp, mut registry) = create_test_registry();
    registry
        .save_configuration(&sample_configuration("https://one.example"))
        .unwrap();
    registry
        .save_configuration(&sample_configuration("https://two.example"))
        .unwrap();

    let websites = registry.list_websites().unwrap();
    assert_eq!(websites.len(), 2);
}
