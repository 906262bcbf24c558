//! Integration tests: whole-order downloads through the Coordinator.

mod common;

use std::fs;

use bundledl_core::config::BundleConfig;
use bundledl_core::coordinator::{BundleError, Coordinator, DownloadFilters};
use bundledl_core::store::{Order, OrderSource, StoreError};
use common::store_server::{self, Route, StoreServer};
use tempfile::tempdir;

const PDF_MD5: &str = "b9292014bb190d0c7b7feab8bf3efdd3";
const PDF_SHA1: &str = "dc7ff2b9006ff69b977c14b282e52b46fe526e78";
const EPUB_MD5: &str = "f81588505d7e458ca5b85d6ba6f7873d";
const EPUB_SHA1: &str = "44587d3eedad06b5d992a245c092cfd4a713660a";

fn serve_books() -> StoreServer {
    store_server::start(vec![
        ("/dl/book.pdf", Route::ok("pdf-body").disposition("Rust Book.pdf")),
        ("/dl/book.epub", Route::ok("epub-body")),
        ("/dl/broken.pdf", Route::status(500)),
    ])
}

fn order_json(server: &StoreServer, formats: &str) -> String {
    let formats = formats.replace("{base}", server.base());
    format!(
        r#"{{
            "gamekey": "key-1",
            "product": {{"human_name": "Rust Bundle", "machine_name": "rust_bundle"}},
            "subproducts": [{{
                "human_name": "Rust Book",
                "machine_name": "rustbook",
                "downloads": [{{"platform": "ebook", "download_struct": [{}]}}]
            }}]
        }}"#,
        formats
    )
}

fn two_formats(server: &StoreServer) -> Order {
    let formats = format!(
        r#"{{"name": "PDF", "url": {{"web": "{{base}}/dl/book.pdf"}}, "file_size": 8, "md5": "{}", "sha1": "{}"}},
           {{"name": "EPUB", "url": {{"web": "{{base}}/dl/book.epub"}}, "file_size": 9, "md5": "{}", "sha1": "{}"}}"#,
        PDF_MD5, PDF_SHA1, EPUB_MD5, EPUB_SHA1
    );
    serde_json::from_str(&order_json(server, &formats)).unwrap()
}

fn coordinator() -> Coordinator {
    Coordinator::new(BundleConfig {
        concurrency: 2,
        ..BundleConfig::default()
    })
}

#[test]
fn downloads_every_format_of_an_order() {
    let server = serve_books();
    let out = tempdir().unwrap();
    let order = two_formats(&server);

    let c = coordinator();
    assert_eq!(c.plan(&order, out.path()).len(), 2);
    let report = c.download(&order, out.path()).expect("order download");

    let dir = out.path().join("Rust Bundle");
    assert_eq!(report.dir, dir);
    assert_eq!((report.total, report.verified, report.failed), (2, 2, 0));
    assert_eq!(fs::read(dir.join("Rust Book.pdf")).unwrap(), b"pdf-body");
    assert_eq!(fs::read(dir.join("rust book.epub")).unwrap(), b"epub-body");
}

#[test]
fn rerun_skips_everything() {
    let server = serve_books();
    let out = tempdir().unwrap();
    let order = two_formats(&server);
    let c = coordinator();

    c.download(&order, out.path()).unwrap();
    let report = c.download(&order, out.path()).unwrap();
    assert_eq!((report.verified, report.skipped, report.failed), (0, 2, 0));
}

#[test]
fn filters_narrow_the_plan() {
    let server = serve_books();
    let out = tempdir().unwrap();
    let order = two_formats(&server);

    let c = coordinator().with_filters(DownloadFilters {
        exclude: Some("pdf".into()),
        ..DownloadFilters::default()
    });
    let report = c.download(&order, out.path()).unwrap();
    assert_eq!(report.total, 1);
    assert!(!out.path().join("Rust Bundle/Rust Book.pdf").exists());
    assert!(out.path().join("Rust Bundle/rust book.epub").exists());

    let c = coordinator().with_filters(DownloadFilters {
        platform: Some("audio".into()),
        ..DownloadFilters::default()
    });
    assert_eq!(c.download(&order, out.path()).unwrap().total, 0);
}

#[test]
fn one_failure_fails_the_order_but_keeps_siblings() {
    let server = serve_books();
    let out = tempdir().unwrap();
    let formats = format!(
        r#"{{"name": "PDF", "url": {{"web": "{{base}}/dl/broken.pdf"}}, "md5": "00"}},
           {{"name": "EPUB", "url": {{"web": "{{base}}/dl/book.epub"}}, "md5": "{}"}}"#,
        EPUB_MD5
    );
    let order: Order = serde_json::from_str(&order_json(&server, &formats)).unwrap();

    match coordinator().download(&order, out.path()) {
        Err(BundleError::FilesFailed {
            order,
            failed,
            total,
        }) => {
            assert_eq!(order, "Rust Bundle");
            assert_eq!((failed, total), (1, 2));
        }
        other => panic!("expected failed order, got {:?}", other),
    }
    assert!(out.path().join("Rust Bundle/rust book.epub").exists());
}

#[test]
fn failures_past_the_ceiling_are_still_counted() {
    let server = serve_books();
    let out = tempdir().unwrap();
    let formats: Vec<String> = (0..5)
        .map(|i| format!(r#"{{"name": "F{}", "url": {{"web": "{{base}}/nope/{}"}}}}"#, i, i))
        .collect();
    let order: Order = serde_json::from_str(&order_json(&server, &formats.join(","))).unwrap();

    let c = Coordinator::new(BundleConfig {
        max_reported_failures: 2,
        ..BundleConfig::default()
    });
    match c.download(&order, out.path()) {
        Err(BundleError::FilesFailed { failed, total, .. }) => assert_eq!((failed, total), (5, 5)),
        other => panic!("expected failed order, got {:?}", other),
    }
}

/// In-memory order source with one unreachable order.
struct FakeSource {
    orders: Vec<Order>,
}

impl OrderSource for FakeSource {
    fn order_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self.orders.iter().map(|o| o.gamekey.clone()).collect();
        keys.push("gone".into());
        Ok(keys)
    }

    fn order(&self, key: &str) -> Result<Order, StoreError> {
        self.orders
            .iter()
            .find(|o| o.gamekey == key)
            .cloned()
            .ok_or_else(|| StoreError::BadStatus {
                url: format!("fake://order/{}", key),
                status: 404,
            })
    }
}

#[test]
fn download_all_continues_past_failed_orders() {
    let server = serve_books();
    let out = tempdir().unwrap();
    let source = FakeSource {
        orders: vec![two_formats(&server)],
    };

    let library = coordinator().download_all(&source, out.path()).unwrap();
    assert_eq!(library.orders.len(), 1);
    assert_eq!(library.failed_orders, vec!["gone".to_string()]);
    assert!(!library.is_success());
    assert!(out.path().join("Rust Bundle/Rust Book.pdf").exists());
}

#[test]
fn same_format_on_two_platforms_lands_in_two_files() {
    let server = store_server::start(vec![
        ("/dl/game-win.zip", Route::ok("pdf-body")),
        ("/dl/game-mac.zip", Route::ok("epub-body")),
    ]);
    let out = tempdir().unwrap();
    let json = format!(
        r#"{{
            "gamekey": "key-2",
            "product": {{"human_name": "Game Bundle"}},
            "subproducts": [{{
                "human_name": "Game",
                "downloads": [
                    {{"platform": "windows", "download_struct": [
                        {{"name": "Download", "url": {{"web": "{base}/dl/game-win.zip"}}, "md5": "{}"}}
                    ]}},
                    {{"platform": "mac", "download_struct": [
                        {{"name": "Download", "url": {{"web": "{base}/dl/game-mac.zip"}}, "md5": "{}"}}
                    ]}}
                ]
            }}]
        }}"#,
        PDF_MD5,
        EPUB_MD5,
        base = server.base()
    );
    let order: Order = serde_json::from_str(&json).unwrap();
    let c = coordinator();

    let report = c.download(&order, out.path()).unwrap();
    assert_eq!((report.verified, report.failed), (2, 0));
    let dir = out.path().join("Game Bundle");
    assert_eq!(fs::read(dir.join("game_windows_video.zip")).unwrap(), b"pdf-body");
    assert_eq!(fs::read(dir.join("game_mac_video.zip")).unwrap(), b"epub-body");
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 2);

    let rerun = c.download(&order, out.path()).unwrap();
    assert_eq!((rerun.verified, rerun.skipped), (0, 2));
}
