//! End-to-end ingestion tests
//!
//! Runs the HTTP client against a throwaway local server, saves snapshots
//! to a temporary data root and transforms them into Parquet.

use chart_processor::config::ChartConfig;
use chart_processor::fetch::{ChartClient, SnapshotWriter};
use chart_processor::ingest::IngestionClient;
use chart_processor::processor::BatchMerger;
use chart_processor::{ChartError, ChartType};
use polars::prelude::*;
use serde_json::json;
use std::fs::{self, File};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn artists_response() -> String {
    json!({"topartists": {
        "artist": [
            {"name": "Artist One", "listeners": "1200", "mbid": "a-1", "url": "https://www.last.fm/music/Artist+One",
             "streamable": "0", "image": [{"#text": "", "size": "small"}], "@attr": {"rank": "1"}},
            {"name": "Artist Two", "listeners": "800", "mbid": "", "url": "https://www.last.fm/music/Artist+Two",
             "streamable": "0", "image": [], "@attr": {"rank": "2"}}
        ],
        "@attr": {"country": "Test", "page": "1", "perPage": "2", "totalPages": "1", "total": "2"}
    }})
    .to_string()
}

fn tracks_response() -> String {
    json!({"tracks": {
        "track": [
            {"name": "Track One", "duration": "201", "listeners": "900", "mbid": "", "url": "https://www.last.fm/music/x/_/Track+One",
             "streamable": {"#text": "0", "fulltrack": "0"},
             "artist": {"name": "Artist One", "mbid": "a-1", "url": "https://www.last.fm/music/Artist+One"},
             "image": [], "@attr": {"rank": "0"}}
        ],
        "@attr": {"country": "Test", "page": "1", "perPage": "1", "totalPages": "1", "total": "1"}
    }})
    .to_string()
}

/// Serve `connections` requests, answering by chart method; returns the
/// base URL and the collected request lines
async fn serve_charts(connections: usize) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/2.0/", listener.local_addr().unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);

    tokio::spawn(async move {
        for _ in 0..connections {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let request_line = String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();

            let body = if request_line.contains("method=geo.gettopartists") {
                artists_response()
            } else {
                tracks_response()
            };
            recorded.lock().unwrap().push(request_line);

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (url, seen)
}

fn test_config(base_url: &str, temp_dir: &TempDir) -> ChartConfig {
    ChartConfig::default()
        .with_api_key("integration_key")
        .with_base_url(base_url)
        .with_data_root(temp_dir.path().join("raw").join("geo"))
        .with_output_root(temp_dir.path().join("data"))
        .with_countries(["United States", "Japan"])
        .with_limit(2)
        .with_request_delay_secs(0.0)
}

#[tokio::test]
async fn test_fetch_and_save_single_chart() {
    let temp_dir = TempDir::new().unwrap();
    let (url, seen) = serve_charts(1).await;
    let config = test_config(&url, &temp_dir);

    let client = ChartClient::new(&config.api).unwrap();
    let document = client
        .fetch("United States", ChartType::Artists, 2, 1)
        .await
        .unwrap();
    let path = SnapshotWriter::new(&config.data_root)
        .save(&document, "United States", ChartType::Artists)
        .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("united_states_"));
    assert!(name.ends_with(".json"));
    assert_eq!(path.parent().unwrap(), config.data_root.join("artists"));

    let request_line = seen.lock().unwrap()[0].clone();
    assert!(request_line.contains("country=United+States"));
    assert!(request_line.contains("api_key=integration_key"));
    assert!(request_line.contains("limit=2"));
}

#[tokio::test]
async fn test_ingest_then_transform() {
    let temp_dir = TempDir::new().unwrap();
    let (url, seen) = serve_charts(4).await;
    let config = test_config(&url, &temp_dir);

    let client = ChartClient::new(&config.api).unwrap();
    let report = IngestionClient::new(client, &config).unwrap().run().await;

    assert_eq!(report.attempted, 4);
    assert!(report.is_complete(), "failures: {:?}", report.failures);
    assert_eq!(seen.lock().unwrap().len(), 4);
    assert_eq!(
        fs::read_dir(config.data_root.join("artists")).unwrap().count(),
        2
    );

    let artists = BatchMerger::new(ChartType::Artists, &config)
        .merge_directory(&config.data_root.join("artists"), &config.output_root)
        .await
        .unwrap();
    assert_eq!(artists.dataset.height(), 4);
    assert!(artists.failures.is_empty());

    let reread = ParquetReader::new(File::open(&artists.output_path).unwrap())
        .finish()
        .unwrap();
    let countries = reread.column("chart_country").unwrap();
    let mut unique: Vec<String> = countries
        .str()
        .unwrap()
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    unique.dedup();
    assert_eq!(unique, vec!["japan".to_string(), "united_states".to_string()]);
    assert_eq!(
        reread.column("artist_listeners").unwrap().i64().unwrap().get(0),
        Some(1200)
    );

    let tracks = BatchMerger::new(ChartType::Tracks, &config)
        .merge_directory(&config.data_root.join("tracks"), &config.output_root)
        .await
        .unwrap();
    assert_eq!(tracks.dataset.height(), 2);
    assert_eq!(
        tracks
            .dataset
            .column("artist_name")
            .unwrap()
            .str()
            .unwrap()
            .get(0),
        Some("Artist One")
    );
    assert!(
        tracks
            .output_path
            .starts_with(config.output_root.join("silver").join("geo").join("tracks"))
    );
}

#[tokio::test]
async fn test_server_error_is_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/2.0/", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 2048];
        let _ = socket.read(&mut buf).await;
        let body = r#"{"error": 29, "message": "Rate limit exceeded"}"#;
        let response = format!(
            "HTTP/1.1 429 Too Many Requests\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
    });

    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&url, &temp_dir);
    let client = ChartClient::new(&config.api).unwrap();

    match client.fetch("Japan", ChartType::Tracks, 2, 1).await {
        Err(ChartError::Request {
            country,
            chart_type,
            ..
        }) => {
            assert_eq!(country, "Japan");
            assert_eq!(chart_type, "tracks");
        }
        other => panic!("Expected Request error, got {:?}", other),
    }
}
