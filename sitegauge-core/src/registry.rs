use rusqlite::{Connection, OptionalExtension, Result, params};
use sitegauge_analyzer::config::SiteConfiguration;
use sitegauge_analyzer::discover::UrlOrigin;
use sitegauge_analyzer::profiles::SiteType;
use sitegauge_analyzer::summary::RegionKind;
use std::fs;
use std::path::Path;
use url::Url;

/// Persistence collaborator for analysis output. Maps one
/// [`SiteConfiguration`] onto registry rows; the analysis engine itself
/// never touches this layer.
pub struct Registry {
    conn: Connection,
}

/// One stored website row.
#[derive(Debug, Clone)]
pub struct WebsiteRecord {
    pub id: String,
    pub name: Option<String>,
    pub base_url: String,
    pub domain: String,
    pub description: Option<String>,
    pub site_type: SiteType,
    pub confidence: f64,
    pub analyzed_at: String,
}

/// One stored capability row.
#[derive(Debug, Clone)]
pub struct StoredCapability {
    pub kind: RegionKind,
    pub confidence: f64,
    pub enabled: bool,
}

/// One stored candidate URL row, in rank order.
#[derive(Debug, Clone)]
pub struct StoredCandidate {
    pub rank: usize,
    pub url: String,
    pub anchor_text: String,
    pub score: f64,
    pub origin: UrlOrigin,
}

impl Registry {
    pub fn drop(path: &Path) {
        let _ = fs::remove_file(path);
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let registry = Registry { conn };
        registry.init_schema()?;
        Ok(registry)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- One row per analyzed website
            CREATE TABLE IF NOT EXISTS websites (
                id TEXT PRIMARY KEY,
                name TEXT,
                base_url TEXT NOT NULL UNIQUE,
                domain TEXT NOT NULL,
                description TEXT,
                site_type TEXT NOT NULL,
                confidence REAL NOT NULL,
                analyzed_at TEXT NOT NULL
            );

            -- Detected capabilities with their derived processing flags
            CREATE TABLE IF NOT EXISTS capabilities (
                website_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                confidence REAL NOT NULL,
                enabled INTEGER NOT NULL,
                PRIMARY KEY (website_id, kind),
                FOREIGN KEY(website_id) REFERENCES websites(id) ON DELETE CASCADE
            );

            -- Ranked candidate URLs handed to the collection layer
            CREATE TABLE IF NOT EXISTS candidate_urls (
                website_id TEXT NOT NULL,
                rank INTEGER NOT NULL,
                url TEXT NOT NULL,
                anchor_text TEXT,
                score REAL NOT NULL,
                origin TEXT NOT NULL,
                PRIMARY KEY (website_id, rank),
                FOREIGN KEY(website_id) REFERENCES websites(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_websites_domain ON websites(domain);
            CREATE INDEX IF NOT EXISTS idx_candidates_website ON candidate_urls(website_id);
            ",
        )
    }

    /// Stores one configuration, replacing any earlier analysis of the same
    /// base URL. Returns the website id.
    pub fn save_configuration(&mut self, config: &SiteConfiguration) -> Result<String> {
        let domain = Url::parse(&config.source_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_default();

        let tx = self.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM websites WHERE base_url = ?1",
                [&config.source_url],
                |row| row.get(0),
            )
            .optional()?;
        let website_id = match existing {
            Some(id) => {
                tx.execute("DELETE FROM capabilities WHERE website_id = ?1", [&id])?;
                tx.execute("DELETE FROM candidate_urls WHERE website_id = ?1", [&id])?;
                id
            }
            None => uuid::Uuid::new_v4().to_string(),
        };

        tx.execute(
            "INSERT OR REPLACE INTO websites
                (id, name, base_url, domain, description, site_type, confidence, analyzed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                website_id,
                config.site_name,
                config.source_url,
                domain,
                config.description,
                config.detection.site_type.as_str(),
                config.detection.confidence,
                config.generated_at.to_rfc3339(),
            ],
        )?;

        for (kind, confidence) in &config.detection.capabilities {
            let flag = sitegauge_analyzer::config::DerivedFlag::for_region(*kind);
            let enabled = config.derived_flags.get(&flag).copied().unwrap_or(false);
            tx.execute(
                "INSERT INTO capabilities (website_id, kind, confidence, enabled)
                 VALUES (?1, ?2, ?3, ?4)",
                params![website_id, kind.as_str(), confidence, enabled],
            )?;
        }

        for (rank, candidate) in config.candidates.iter().enumerate() {
            tx.execute(
                "INSERT INTO candidate_urls (website_id, rank, url, anchor_text, score, origin)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    website_id,
                    rank as i64,
                    candidate.url,
                    candidate.anchor_text,
                    candidate.score,
                    candidate.origin.as_str(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(website_id)
    }

    pub fn find_by_url(&self, base_url: &str) -> Result<Option<WebsiteRecord>> {
        self.conn
            .query_row(
                "SELECT id, name, base_url, domain, description, site_type, confidence, analyzed_at
                 FROM websites WHERE base_url = ?1",
                [base_url],
                row_to_website,
            )
            .optional()
    }

    pub fn list_websites(&self) -> Result<Vec<WebsiteRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, base_url, domain, description, site_type, confidence, analyzed_at
             FROM websites ORDER BY analyzed_at DESC",
        )?;
        let rows = stmt.query_map([], row_to_website)?;
        rows.collect()
    }

    pub fn capabilities_for(&self, website_id: &str) -> Result<Vec<StoredCapability>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, confidence, enabled FROM capabilities
             WHERE website_id = ?1 ORDER BY kind",
        )?;
        let rows = stmt.query_map([website_id], |row| {
            let kind: String = row.get(0)?;
            Ok(StoredCapability {
                kind: RegionKind::from_str(&kind).unwrap_or(RegionKind::NavTop),
                confidence: row.get(1)?,
                enabled: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    pub fn candidates_for(&self, website_id: &str) -> Result<Vec<StoredCandidate>> {
        let mut stmt = self.conn.prepare(
            "SELECT rank, url, anchor_text, score, origin FROM candidate_urls
             WHERE website_id = ?1 ORDER BY rank",
        )?;
        let rows = stmt.query_map([website_id], |row| {
            let origin: String = row.get(4)?;
            Ok(StoredCandidate {
                rank: row.get::<_, i64>(0)? as usize,
                url: row.get(1)?,
                anchor_text: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                score: row.get(3)?,
                origin: UrlOrigin::from_str(&origin).unwrap_or(UrlOrigin::SameDomain),
            })
        })?;
        rows.collect()
    }
}

fn row_to_website(row: &rusqlite::Row<'_>) -> rusqlite::Result<WebsiteRecord> {
    let site_type: String = row.get(5)?;
    Ok(WebsiteRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        base_url: row.get(2)?,
        domain: row.get(3)?,
        description: row.get(4)?,
        site_type: SiteType::from_str(&site_type).unwrap_or(SiteType::Unknown),
        confidence: row.get(6)?,
        analyzed_at: row.get(7)?,
    })
}
