//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the Lodestone and run the full
//! listing, enrichment and archive cycle end-to-end over real HTTP.

use cc_harvest::config::{parse_config, Config};
use cc_harvest::{Category, Coordinator};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WHM_ICON: &str = "https://img.finalfantasyxiv.com/h/7/i20QvSPcSQTybykLZDbQCgPwMw.png?1700000000";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, groups: &[&str], archive_dir: &Path) -> Config {
    let groups: Vec<String> = groups.iter().map(|g| format!("\"{}\"", g)).collect();
    parse_config(&format!(
        r#"
        [crawler]
        base-url = "{}"
        groups = [{}]
        max-pages = 1
        page-size = 50
        workers = 4
        max-attempts = 2
        backoff-base-ms = 5
        max-backoff-ms = 20

        [rate-limit.listing]
        calls = 50
        period-ms = 100

        [rate-limit.detail]
        calls = 50
        period-ms = 100

        [user-agent]
        name = "cc-harvest-test"
        version = "0.0.1"

        [output]
        format = "csv"
        archive-dir = "{}"
        "#,
        base_url,
        groups.join(", "),
        archive_dir.display()
    ))
    .expect("test config should be valid")
}

fn row(id: u64, rank: u32, prev: &str, points: &str, group: &str) -> String {
    format!(
        r#"<div class="ranking_set" data-href="/lodestone/character/{id}/">
            <h3>Player {id}</h3>
            <div class="order">{rank}</div>
            <div class="prev_order">{prev}</div>
            <div class="world">Cerberus [{group}]</div>
            <div class="points">{points}</div>
            <div class="face-wrapper"><img src="https://img2.finalfantasyxiv.com/f/{id}_c0.jpg"/></div>
            <div class="tier"><img data-tooltip="Diamond"/></div>
            <div class="wins">12 +1</div>
        </div>"#
    )
}

fn listing(first_id: u64, rows: usize, group: &str) -> String {
    let body: String = (0..rows)
        .map(|i| row(first_id + i as u64, i as u32 + 1, "3", "1500 +10", group))
        .collect();
    format!("<html><body>{}</body></html>", body)
}

fn profile(icon: &str) -> String {
    format!(
        r#"<html><body><div class="character__class_icon"><img src="{}"/></div></body></html>"#,
        icon
    )
}

async fn mount_listing(server: &MockServer, group: &str, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/lodestone/ranking/crystallineconflict/"))
        .and(query_param("dcgroup", group))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_profiles(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/lodestone/character/\d+/$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(profile(WHM_ICON)))
        .mount(server)
        .await;
}

fn read_archive(receipt_location: &str) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(receipt_location).expect("archive should exist");
    reader.records().map(|r| r.unwrap()).collect()
}

#[tokio::test]
async fn test_two_groups_full_and_short_listing() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    mount_listing(&server, "Chaos", "1", listing(1, 50, "Chaos")).await;
    mount_listing(&server, "Light", "1", listing(1000, 30, "Light")).await;
    mount_profiles(&server).await;

    let config = create_test_config(&server.uri(), &["Chaos", "Light"], archive.path());
    let mut coordinator = Coordinator::new(config, "test-hash").unwrap();
    let report = coordinator.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.entrants.len(), 80);
    assert_eq!(report.statistics.groups[0].entrants, 50);
    assert_eq!(report.statistics.groups[1].entrants, 30);
    assert_eq!(report.statistics.groups[1].pages, 1);
    assert!(report.entrants.iter().all(|e| e.category == Category::Whm));

    let received = server.received_requests().await.unwrap();
    let listing_calls = received
        .iter()
        .filter(|r| r.url.path().contains("crystallineconflict"))
        .count();
    assert_eq!(listing_calls, 2);

    let receipt = report.receipt.expect("set should be archived");
    let rows = read_archive(&receipt.location);
    assert_eq!(rows.len(), 80);
    assert_eq!(&rows[0][1], "1");
    assert_eq!(&rows[50][1], "1000");
    assert_eq!(&rows[50][5], "Light");
    assert_eq!(&rows[79][12], "WHM");
}

#[tokio::test]
async fn test_listing_field_defaults() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    let body = format!(
        "<html><body>{}{}</body></html>",
        row(11, 1, "-", "1000 +50", "Chaos"),
        row(12, 2, "7", "1000", "Chaos")
    );
    mount_listing(&server, "Chaos", "1", body).await;
    mount_profiles(&server).await;

    let config = create_test_config(&server.uri(), &["Chaos"], archive.path());
    let mut coordinator = Coordinator::new(config, "test-hash").unwrap();
    let report = coordinator.run(&CancellationToken::new()).await.unwrap();

    let first = &report.entrants[0];
    assert_eq!(first.previous_rank, 0);
    assert_eq!(first.points, 1000);
    assert_eq!(first.points_delta, 50);
    assert_eq!(first.tier, "Diamond");
    assert_eq!(first.portrait, "11_c0.jpg");

    let second = &report.entrants[1];
    assert_eq!(second.previous_rank, 7);
    assert_eq!(second.points, 1000);
    assert_eq!(second.points_delta, 0);
}

#[tokio::test]
async fn test_private_profile_is_archived_as_unknown() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    let body = format!(
        "<html><body>{}{}{}</body></html>",
        row(998, 1, "1", "900 +1", "Chaos"),
        row(999, 2, "2", "800 +1", "Chaos"),
        row(1000, 3, "3", "700 +1", "Chaos")
    );
    mount_listing(&server, "Chaos", "1", body).await;

    // Registered first so it takes precedence over the catch-all profile mock
    Mock::given(method("GET"))
        .and(path("/lodestone/character/999/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .expect(1)
        .mount(&server)
        .await;
    mount_profiles(&server).await;

    let config = create_test_config(&server.uri(), &["Chaos"], archive.path());
    let mut coordinator = Coordinator::new(config, "test-hash").unwrap();
    let report = coordinator.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.entrants.len(), 3);
    assert_eq!(report.statistics.denied, 1);
    assert_eq!(report.statistics.enriched, 2);

    let rows = read_archive(&report.receipt.unwrap().location);
    let jobs: Vec<(&str, &str)> = rows.iter().map(|r| (&r[1], &r[12])).collect();
    assert_eq!(
        jobs,
        vec![("998", "WHM"), ("999", "UNKNOWN"), ("1000", "WHM")]
    );
}

#[tokio::test]
async fn test_listing_outage_is_retried_then_skipped() {
    let server = MockServer::start().await;
    let archive = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/lodestone/ranking/crystallineconflict/"))
        .and(query_param("dcgroup", "Chaos"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    mount_listing(&server, "Light", "1", listing(1, 4, "Light")).await;
    mount_profiles(&server).await;

    let config = create_test_config(&server.uri(), &["Chaos", "Light"], archive.path());
    let mut coordinator = Coordinator::new(config, "test-hash").unwrap();
    let report = coordinator.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.statistics.failed_groups, 1);
    assert_eq!(report.entrants.len(), 4);
    assert!(report.receipt.is_some());
}

#[tokio::test]
async fn test_sqlite_archive_records_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("harvest.db");

    mount_listing(&server, "Chaos", "1", listing(1, 5, "Chaos")).await;
    mount_profiles(&server).await;

    let mut config = create_test_config(&server.uri(), &["Chaos"], dir.path());
    config.output.format = cc_harvest::config::OutputFormat::Sqlite;
    config.output.database_path = db_path.display().to_string();

    let mut coordinator = Coordinator::new(config, "abc").unwrap();
    let report = coordinator.run(&CancellationToken::new()).await.unwrap();
    drop(coordinator);

    let receipt = report.receipt.unwrap();
    assert_eq!(receipt.rows, 5);

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let (status, count, hash): (String, i64, String) = conn
        .query_row(
            "SELECT status, entrant_count, config_hash FROM runs ORDER BY id DESC LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(status, "completed");
    assert_eq!(count, 5);
    assert_eq!(hash, "abc");
}
