//! End-to-end ingestion against a local HTTP server: candidate fallback,
//! archive unwrapping, header detection, and normalization in one pass.

use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::time::Duration;

use licscraper::config::Config;
use licscraper::error::IngestError;
use licscraper::fetch;
use licscraper::parse::header::slot;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::{ExtendedFileOptions, FileOptions};
use zip::CompressionMethod;

const CSV: &str = "\
Category,Type,License #,Holder,DBA,Extra,Qualified Rep,MN Manager,Address 1,Address 2,City,State,Zip,MN Phone,Corp Phone,Email,Original License Date,Next Reissuance
Plumbing,Contractor,100,Acme Corp,Acme,,Rep,Mgr,1 Main St,,St Paul,MN,55101,555-0100,555-0200,a@acme.test,1/2/2003,6/30/2026
,,,,,,,,,,,,,,,,,
Plumbing,Contractor,23,Smith Plumbing,,,Rep,Mgr,2 Oak Ave,,Duluth,MN,55802,555-0300,,s@smith.test,3/4/2010,6/30/2026
";

fn zip_with_csv(name: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options =
            FileOptions::<ExtendedFileOptions>::default().compression_method(CompressionMethod::Stored);
        zip.start_file(name, options).unwrap();
        zip.write_all(CSV.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn config(shared_url: String, direct_file_url: Option<String>) -> Config {
    Config {
        shared_url,
        direct_file_url,
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        cache_ttl: Duration::from_secs(600),
    }
}

#[tokio::test]
async fn falls_back_past_a_dead_candidate_and_parses_the_archive() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/direct.xlsx"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/zip")
                .set_body_bytes(zip_with_csv("license_registry_export.csv")),
        )
        .mount(&server)
        .await;

    let cfg = config(
        format!("{}/shared", server.uri()),
        Some(format!("{}/direct.xlsx", server.uri())),
    );
    let client = fetch::client().unwrap();

    let snapshot = fetch::fetch_and_parse(&client, &cfg).await.unwrap();

    // The blank separator row is gone; the header row mapped the moved slots.
    assert_eq!(snapshot.records.len(), 2);
    assert_eq!(snapshot.column_map.source_index(slot::LICENSE_NUMBER), 2);
    assert_eq!(snapshot.column_map.source_index(slot::ORIGINAL_DATE), 16);
    assert_eq!(snapshot.column_map.source_index(slot::NEXT_REISSUE), 17);

    let acme = &snapshot.records[0];
    assert_eq!(acme.license_number, "100");
    assert_eq!(acme.holder, "Acme Corp");
    assert_eq!(acme.original_date, "1/2/2003");
    assert_eq!(acme.mn_address, "1 Main St • St Paul, MN • 55101");
}

#[tokio::test]
async fn plain_csv_response_parses_without_an_archive() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(CSV, "text/csv; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let cfg = config(format!("{}/shared", server.uri()), None);
    let client = fetch::client().unwrap();

    let snapshot = fetch::fetch_and_parse(&client, &cfg).await.unwrap();
    assert_eq!(snapshot.records.len(), 2);
    assert_eq!(snapshot.records[1].license_number, "23");
}

#[tokio::test]
async fn html_error_page_fails_the_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/octet-stream")
                .set_body_string("<html><body>Please sign in</body></html>"),
        )
        .mount(&server)
        .await;

    let cfg = config(format!("{}/shared", server.uri()), None);
    let client = fetch::client().unwrap();

    let err = fetch::fetch_and_parse(&client, &cfg).await.unwrap_err();
    match err {
        IngestError::Exhausted(inner) => match *inner {
            IngestError::Format(msg) => assert!(msg.contains("HTML")),
            other => panic!("expected Format, got {other}"),
        },
        other => panic!("expected Exhausted, got {other}"),
    }
}

#[tokio::test]
async fn exhausted_error_wraps_the_last_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("content-type", "text/plain")
                .set_body_string("maintenance window"),
        )
        .mount(&server)
        .await;

    let cfg = config(
        format!("{}/shared", server.uri()),
        Some(format!("{}/direct.xlsx", server.uri())),
    );
    let client = fetch::client().unwrap();

    let err = fetch::fetch_and_parse(&client, &cfg).await.unwrap_err();
    match err {
        IngestError::Exhausted(inner) => match *inner {
            IngestError::Fetch {
                status, snippet, ..
            } => {
                assert_eq!(status, 503);
                assert!(snippet.contains("maintenance"));
            }
            other => panic!("expected Fetch, got {other}"),
        },
        other => panic!("expected Exhausted, got {other}"),
    }
}
