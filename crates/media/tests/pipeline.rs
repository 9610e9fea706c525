//! End-to-end pipeline tests against a local image origin.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use {
    axum::{
        Router,
        body::{Body, Bytes},
        http::{Response, header},
        routing::get,
    },
    image::RgbImage,
    sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    vignette_media::{Error, ImageService, MediaStorage, ServiceOptions},
    vignette_store::SqliteImageStore,
};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Fake remote origin: a small PNG, oversized payloads (with and without a
/// `Content-Length`), a non-image page, and a response with no content type.
async fn spawn_origin() -> SocketAddr {
    let png = png_bytes(64, 48);
    let app = Router::new()
        .route(
            "/cat.png",
            get(move || {
                let png = png.clone();
                async move { ([(header::CONTENT_TYPE, "image/png")], png) }
            }),
        )
        .route(
            "/huge.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0u8; 6 * 1024 * 1024]) }),
        )
        .route(
            "/chunked.png",
            get(|| async {
                // 6 MiB streamed without a Content-Length header.
                let chunks = (0..96)
                    .map(|_| Ok::<_, std::io::Error>(Bytes::from(vec![0u8; 64 * 1024])));
                Response::builder()
                    .header(header::CONTENT_TYPE, "image/png")
                    .body(Body::from_stream(futures::stream::iter(chunks)))
                    .unwrap()
            }),
        )
        .route(
            "/page",
            get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html></html>") }),
        )
        .route(
            "/notype",
            get(|| async { Response::builder().body(Body::from("payload")).unwrap() }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn service(dir: &Path) -> ImageService {
    let opts = SqliteConnectOptions::new()
        .filename(dir.join("vignette.db"))
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(opts).await.unwrap();
    SqliteImageStore::init(&pool).await.unwrap();
    let store = Arc::new(SqliteImageStore::new(pool));

    ImageService::new(
        MediaStorage::new(dir),
        store,
        ServiceOptions {
            timeout: Duration::from_secs(5),
            ..ServiceOptions::default()
        },
    )
    .unwrap()
}

fn images_file_count(dir: &Path) -> usize {
    match std::fs::read_dir(dir.join("images")) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

#[tokio::test]
async fn test_create_and_fetch_round_trip() {
    let origin = spawn_origin().await;
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path()).await;

    let record = service
        .create_from_url(&format!("http://{origin}/cat.png"))
        .await
        .unwrap();
    assert_eq!(record.id, 1);
    assert!(record.storage_path.starts_with("images/"));
    assert!(record.storage_path.ends_with(".png"));
    assert!(dir.path().join(&record.storage_path).exists());

    let found = service.original(1).await.unwrap();
    assert_eq!(found, record);
}

#[tokio::test]
async fn test_invalid_urls_leave_no_trace() {
    let origin = spawn_origin().await;
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path()).await;

    for url in [
        format!("http://{origin}/page"),
        format!("http://{origin}/notype"),
        format!("http://{origin}/missing.png"),
        "http://127.0.0.1:1/cat.png".to_owned(),
    ] {
        let result = service.create_from_url(&url).await;
        assert!(matches!(result, Err(Error::InvalidUrl { .. })), "{url}");
    }

    assert_eq!(service.count().await.unwrap(), 0);
    assert_eq!(images_file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_oversized_payload_leaves_no_trace() {
    let origin = spawn_origin().await;
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path()).await;

    // Declared via Content-Length.
    let result = service
        .create_from_url(&format!("http://{origin}/huge.png"))
        .await;
    assert!(matches!(result, Err(Error::TooLarge { .. })));

    // No Content-Length: the streamed byte count is what gets enforced.
    let result = service
        .create_from_url(&format!("http://{origin}/chunked.png"))
        .await;
    assert!(matches!(result, Err(Error::TooLarge { .. })));

    assert_eq!(service.count().await.unwrap(), 0);
    assert_eq!(images_file_count(dir.path()), 0);
}

#[tokio::test]
async fn test_concurrent_creations_get_contiguous_ids() {
    let origin = spawn_origin().await;
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(service(dir.path()).await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let url = format!("http://{origin}/cat.png");
        handles.push(tokio::spawn(async move {
            service.create_from_url(&url).await.unwrap().id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_thumbnail_generation_and_cache() {
    let origin = spawn_origin().await;
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path()).await;

    let record = service
        .create_from_url(&format!("http://{origin}/cat.png"))
        .await
        .unwrap();

    let thumb = service.thumbnail(record.id, 300).await.unwrap();
    assert!(thumb.ends_with("_300x300.png"));
    let thumb_abs = dir.path().join(&thumb);
    assert_eq!(image::image_dimensions(&thumb_abs).unwrap(), (300, 300));

    // Second request reuses the derivative untouched.
    let bytes = std::fs::read(&thumb_abs).unwrap();
    let again = service.thumbnail(record.id, 300).await.unwrap();
    assert_eq!(again, thumb);
    assert_eq!(std::fs::read(&thumb_abs).unwrap(), bytes);

    let result = service.thumbnail(record.id, 77).await;
    assert!(matches!(result, Err(Error::UnsupportedSize { size: 77 })));
}

#[tokio::test]
async fn test_delete_removes_derivative_family() {
    let origin = spawn_origin().await;
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path()).await;

    let record = service
        .create_from_url(&format!("http://{origin}/cat.png"))
        .await
        .unwrap();
    service.thumbnail(record.id, 100).await.unwrap();
    service.thumbnail(record.id, 300).await.unwrap();
    assert_eq!(images_file_count(dir.path()), 3);

    service.delete(record.id).await.unwrap();
    assert_eq!(images_file_count(dir.path()), 0);
    assert!(matches!(
        service.original(record.id).await,
        Err(Error::NotFound)
    ));
    assert!(matches!(
        service.delete(record.id).await,
        Err(Error::NotFound)
    ));
}

#[tokio::test]
async fn test_record_with_missing_file_reads_not_found() {
    let origin = spawn_origin().await;
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path()).await;

    let record = service
        .create_from_url(&format!("http://{origin}/cat.png"))
        .await
        .unwrap();
    std::fs::remove_file(dir.path().join(&record.storage_path)).unwrap();

    assert!(matches!(
        service.original(record.id).await,
        Err(Error::NotFound)
    ));
    assert!(matches!(
        service.thumbnail(record.id, 100).await,
        Err(Error::NotFound)
    ));
}
