//! Integration tests for the download helpers.
//!
//! These tests verify the fetch-then-persist flow with mock HTTP servers.

mod support;
use support::flaky_body::{FlakyBodyServer, Interruption};
use support::socket_guard::start_mock_server_or_skip;

use std::path::Path;
use std::time::Duration;

use grabbag_core::content::Strategy;
use grabbag_core::{DownloadError, Downloader, FetchConfig, FetchError, Fetcher, Naming, PersistError};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0\x1f\x15\xc4\x89";
const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0\x01\x01\0\0\x01\0\x01\0\0jpeg-data";

fn downloader(max_retries: u32) -> Downloader {
    let config = FetchConfig::default()
        .with_max_retries(max_retries)
        .with_delay(Duration::ZERO);
    Downloader::new(Fetcher::new(&config).expect("client should build"))
}

async fn serve(mock_server: &MockServer, path_str: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(mock_server)
        .await;
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("dir should exist")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_download_to_file_preserves_content() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = b"This is the complete file content.\nLine 2.\nLine 3.";
    serve(&mock_server, "/ost/readme.txt", content).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let target = temp_dir.path().join("nested").join("readme.txt");
    let url = format!("{}/ost/readme.txt", mock_server.uri());
    let saved = downloader(0).download_to_file(&url, &target).await.unwrap();

    assert_eq!(saved, target);
    assert_eq!(std::fs::read(&saved).unwrap(), content);
}

#[tokio::test]
async fn test_download_to_file_recovers_from_stalled_body() {
    const TILE: &[u8] = b"\x89PNG\r\n\x1a\n tile bytes that arrive in two tries";
    let Some(server) = FlakyBodyServer::start_or_skip(TILE, 1, Interruption::Stall).await else {
        return;
    };
    let config = FetchConfig::default()
        .with_max_retries(2)
        .with_delay(Duration::ZERO)
        .with_read_timeout(Duration::from_secs(1));
    let downloader = Downloader::new(Fetcher::new(&config).unwrap());
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("13").join("6420").join("4063.png");

    let saved = downloader
        .download_to_file(&server.url("/13/6420/4063.png"), &target)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&saved).unwrap(), TILE);
    assert_eq!(file_names(&temp_dir.path().join("13/6420")), vec!["4063.png".to_string()]);
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn test_download_guess_extension_recovers_from_truncated_body() {
    let Some(server) = FlakyBodyServer::start_or_skip(JPEG, 1, Interruption::Truncate).await
    else {
        return;
    };
    let temp_dir = TempDir::new().unwrap();
    let (saved, _) = downloader(1)
        .download_guess_extension(&server.url("/c/1/001.png"), temp_dir.path(), "1")
        .await
        .unwrap();

    assert_eq!(saved, temp_dir.path().join("1.jpg"));
    assert_eq!(std::fs::read(&saved).unwrap(), JPEG);
    assert_eq!(file_names(temp_dir.path()), vec!["1.jpg".to_string()]);
}

#[tokio::test]
async fn test_download_original_name_decodes_last_segment() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    serve(&mock_server, "/album/01%20Main%20Theme.mp3", b"ID3 audio").await;
    let temp_dir = TempDir::new().unwrap();

    let url = format!("{}/album/01%20Main%20Theme.mp3", mock_server.uri());
    let saved = downloader(0)
        .download_original_name(&url, temp_dir.path(), false)
        .await
        .unwrap();

    assert_eq!(saved, temp_dir.path().join("01 Main Theme.mp3"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"ID3 audio");
}

#[tokio::test]
async fn test_download_original_name_with_path_nests_directories() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    serve(&mock_server, "/13/6420/4063.png", PNG).await;
    let temp_dir = TempDir::new().unwrap();

    let url = format!("{}/13/6420/4063.png", mock_server.uri());
    let saved = downloader(0)
        .download_original_name(&url, temp_dir.path(), true)
        .await
        .unwrap();

    assert_eq!(saved, temp_dir.path().join("13").join("6420").join("4063.png"));
    assert_eq!(std::fs::read(&saved).unwrap(), PNG);
}

#[tokio::test]
async fn test_download_guess_extension_trusts_content_over_url() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    serve(&mock_server, "/c/1/001.png", JPEG).await;
    let temp_dir = TempDir::new().unwrap();

    let url = format!("{}/c/1/001.png", mock_server.uri());
    let (saved, classification) = downloader(0)
        .download_guess_extension(&url, temp_dir.path(), "1")
        .await
        .unwrap();

    assert_eq!(saved, temp_dir.path().join("1.jpg"));
    assert_eq!(classification.strategy, Strategy::ImageDecoder);
    assert_eq!(std::fs::read(&saved).unwrap(), JPEG);
    assert_eq!(file_names(temp_dir.path()), vec!["1.jpg"]);
}

#[tokio::test]
async fn test_download_guess_extension_detects_block_page() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    serve(
        &mock_server,
        "/c/1/002.jpg",
        b"<!DOCTYPE html><html><title>Just a moment...</title></html>",
    )
    .await;
    let temp_dir = TempDir::new().unwrap();

    let url = format!("{}/c/1/002.jpg", mock_server.uri());
    let (saved, classification) = downloader(0)
        .download_guess_extension(&url, temp_dir.path(), "2")
        .await
        .unwrap();

    assert_eq!(saved, temp_dir.path().join("2.html"));
    assert_eq!(classification.strategy, Strategy::Markup);
}

#[tokio::test]
async fn test_download_guess_extension_falls_back_to_url_path() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    serve(&mock_server, "/files/foo.bin", b"\x00\x13\x37").await;
    let temp_dir = TempDir::new().unwrap();

    let url = format!("{}/files/foo.bin", mock_server.uri());
    let (saved, classification) = downloader(0)
        .download_guess_extension(&url, temp_dir.path(), "3")
        .await
        .unwrap();

    assert_eq!(saved, temp_dir.path().join("3.bin"));
    assert_eq!(classification.strategy, Strategy::UrlPath);
}

#[tokio::test]
async fn test_download_batch_sequential_names_in_order() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    serve(&mock_server, "/c/1/a", PNG).await;
    serve(&mock_server, "/c/1/b", JPEG).await;
    serve(&mock_server, "/c/1/c", b"GIF89a\x01\0\x01\0\0\0\0").await;
    let temp_dir = TempDir::new().unwrap();

    let urls: Vec<Url> = ["a", "b", "c"]
        .iter()
        .map(|page| Url::parse(&format!("{}/c/1/{page}", mock_server.uri())).unwrap())
        .collect();
    let report = downloader(0)
        .download_batch(&urls, temp_dir.path(), Naming::Sequential { start: 9 })
        .await
        .unwrap();

    assert_eq!(
        report.paths,
        vec![
            temp_dir.path().join("9.png"),
            temp_dir.path().join("10.jpg"),
            temp_dir.path().join("11.gif"),
        ]
    );
}

#[tokio::test]
async fn test_download_batch_aborts_and_reports_completed_count() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    serve(&mock_server, "/ost/01.mp3", b"one").await;
    serve(&mock_server, "/ost/02.mp3", b"two").await;
    Mock::given(method("GET"))
        .and(path("/ost/03.mp3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;
    serve(&mock_server, "/ost/04.mp3", b"four").await;
    let temp_dir = TempDir::new().unwrap();

    let urls: Vec<Url> = ["01", "02", "03", "04"]
        .iter()
        .map(|n| Url::parse(&format!("{}/ost/{n}.mp3", mock_server.uri())).unwrap())
        .collect();
    let err = downloader(1)
        .download_batch(&urls, temp_dir.path(), Naming::Original { with_path: false })
        .await
        .unwrap_err();

    assert_eq!(err.index, 2);
    assert_eq!(err.completed, 2);
    assert!(err.url.ends_with("/ost/03.mp3"));
    assert!(matches!(
        err.source,
        DownloadError::Fetch(FetchError::Exhausted { attempts: 2, .. })
    ));
    assert_eq!(file_names(temp_dir.path()), vec!["01.mp3", "02.mp3"]);
}

#[tokio::test]
async fn test_download_into_file_path_is_persist_error() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    serve(&mock_server, "/p/1.jpg", JPEG).await;
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let url = format!("{}/p/1.jpg", mock_server.uri());
    let err = downloader(0)
        .download_original_name(&url, &blocker, false)
        .await
        .unwrap_err();

    assert!(
        matches!(err, DownloadError::Persist(PersistError::Io { .. })),
        "got {err:?}"
    );
}
