//! Download side of the pipeline: candidate resolution, the HTTP fetch, and
//! the dispatch that turns one successful download into a snapshot.

pub mod archive;
pub mod sources;

use bytes::Bytes;
use reqwest::Client;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::IngestError;
use crate::fetch::archive::TableFile;
use crate::parse::{self, Snapshot};

/// Some hosts refuse obviously scripted clients, so the client carries a
/// browser-shaped user agent.
const USER_AGENT: &str = "Mozilla/5.0 (LicenseScraper)";

/// How far into the payload to look when sniffing for an HTML error page.
const SNIFF_WINDOW: usize = 2048;

/// What the declared content type says the payload is. Produced once per
/// download; everything downstream dispatches on this, not on header strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Archive,
    Csv,
    Workbook,
    Unknown,
}

pub fn classify(content_type: &str) -> Payload {
    let ct = content_type.to_lowercase();
    if ct.contains("zip") {
        Payload::Archive
    } else if ct.contains("csv") {
        Payload::Csv
    } else if ct.contains("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        || ct.contains("application/vnd.ms-excel")
    {
        Payload::Workbook
    } else {
        Payload::Unknown
    }
}

pub fn client() -> reqwest::Result<Client> {
    Client::builder().user_agent(USER_AGENT).build()
}

pub struct Fetched {
    pub content_type: String,
    pub bytes: Bytes,
}

/// GET one URL, following redirects. Non-2xx responses become a fetch error
/// carrying the status, declared content type, and the head of the body.
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Fetched, IngestError> {
    let resp = client
        .get(url)
        .header(reqwest::header::ACCEPT, "*/*")
        .send()
        .await?;

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase();

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(IngestError::Fetch {
            url: url.to_string(),
            status: status.as_u16(),
            content_type,
            snippet: body.chars().take(200).collect(),
        });
    }

    let bytes = resp.bytes().await?;
    Ok(Fetched {
        content_type,
        bytes,
    })
}

/// Run the full ingestion chain: try each candidate URL in priority order and
/// commit to the first one whose download, unwrap, and parse all succeed.
/// Only the last candidate's error survives when everything fails.
#[instrument(skip(client, config))]
pub async fn fetch_and_parse(client: &Client, config: &Config) -> Result<Snapshot, IngestError> {
    let candidates =
        sources::candidate_urls(&config.shared_url, config.direct_file_url.as_deref());

    let mut last_err: Option<IngestError> = None;
    for url in &candidates {
        match ingest_candidate(client, url).await {
            Ok(snapshot) => {
                info!(url = %url, records = snapshot.records.len(), "ingestion succeeded");
                return Ok(snapshot);
            }
            Err(e) => {
                warn!(url = %url, error = %e, "candidate failed, trying next");
                last_err = Some(e);
            }
        }
    }

    Err(last_err
        .map(IngestError::exhausted)
        .unwrap_or_else(|| IngestError::Format("no download candidates".to_string())))
}

async fn ingest_candidate(client: &Client, url: &str) -> Result<Snapshot, IngestError> {
    let fetched = fetch_bytes(client, url).await?;
    let grid = match classify(&fetched.content_type) {
        Payload::Archive => grid_from_archive(&fetched.bytes)?,
        Payload::Csv => parse::grid_from_csv(&String::from_utf8_lossy(&fetched.bytes))?,
        Payload::Workbook => parse::grid_from_workbook(&fetched.bytes)?,
        Payload::Unknown => {
            if looks_like_html(&fetched.bytes) {
                return Err(IngestError::Format(
                    "received an HTML page instead of a data file".to_string(),
                ));
            }
            // Content type told us nothing. An .xlsx is itself a zip, so try
            // the archive path first and fall back to a bare workbook read.
            match grid_from_archive(&fetched.bytes) {
                Ok(grid) => grid,
                Err(_) => parse::grid_from_workbook(&fetched.bytes)?,
            }
        }
    };
    Ok(parse::to_snapshot(grid))
}

fn grid_from_archive(bytes: &[u8]) -> Result<Vec<Vec<String>>, IngestError> {
    match archive::extract_table(bytes)? {
        TableFile::Workbook(data) => parse::grid_from_workbook(&data),
        TableFile::Csv(text) => parse::grid_from_csv(&text),
    }
}

fn looks_like_html(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    String::from_utf8_lossy(head).to_lowercase().contains("<html")
}
