use std::io::Cursor;
use std::net::SocketAddr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgb, RgbImage};
use imembed::CacheBuilder;
use imembed::server::{AppState, EraseResponse, IdsResponse, ImageView, SubmitResponse, create_app};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use rstest::*;
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

fn png(seed: u8) -> Vec<u8> {
    let image = RgbImage::from_fn(10, 10, |x, y| Rgb([seed, (x * 20) as u8, (y * 20) as u8]));
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

struct TestServer {
    addr: SocketAddr,
    client: reqwest::Client,
    _conf_dir: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn submit(&self, name: &str, data: &[u8]) -> reqwest::Response {
        self.client
            .post(self.url("/images"))
            .json(&json!({ "name": name, "content": STANDARD.encode(data) }))
            .send()
            .await
            .unwrap()
    }

    async fn list(&self) -> Vec<i64> {
        let resp = self.client.get(self.url("/images")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json::<IdsResponse>().await.unwrap().ids
    }
}

#[fixture]
async fn server() -> TestServer {
    let conf_dir = TempDir::new().unwrap();
    let cache = CacheBuilder::new(conf_dir.path().to_string_lossy().parse().unwrap())
        .open()
        .await
        .unwrap();
    let app = create_app(AppState::new(cache));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    TestServer { addr, client: reqwest::Client::new(), _conf_dir: conf_dir }
}

#[rstest]
#[tokio::test]
async fn test_submit_dedup(#[future] server: TestServer) {
    let server = server.await;
    let f1 = png(1);

    let first = server.submit("a.png", &f1).await.json::<SubmitResponse>().await.unwrap();
    let second = server.submit("b.png", &f1).await.json::<SubmitResponse>().await.unwrap();
    let third = server.submit("c.png", &png(2)).await.json::<SubmitResponse>().await.unwrap();

    assert_eq!(first.id, second.id);
    assert_ne!(first.id, third.id);
    assert_eq!(server.list().await, vec![first.id, third.id]);
}

#[rstest]
#[tokio::test]
async fn test_get_image(#[future] server: TestServer) {
    let server = server.await;
    let f1 = png(3);
    let id = server.submit("a.png", &f1).await.json::<SubmitResponse>().await.unwrap().id;

    let resp = server.client.get(server.url(&format!("/images/{id}"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let view = resp.json::<ImageView>().await.unwrap();
    assert_eq!(view.id, id);
    assert_eq!(view.name, "a.png");
    assert_eq!(STANDARD.decode(view.data).unwrap(), f1);
    assert_eq!(view.digest.len(), 64);
    assert_eq!(view.embedding.len(), 256);

    let resp = server.client.get(server.url("/images/999")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn test_invalid_content(#[future] server: TestServer) {
    let server = server.await;

    let resp = server
        .client
        .post(server.url("/images"))
        .json(&json!({ "name": "a.png", "content": "%%%" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server.submit("a.png", b"not an image").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(server.list().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_erase(#[future] server: TestServer) {
    let server = server.await;
    server.submit("a.png", &png(1)).await;
    server.submit("b.png", &png(2)).await;

    let resp = server.client.delete(server.url("/images")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let erase = resp.json::<EraseResponse>().await.unwrap();
    assert_eq!(erase.outcome, "committed");
    assert_eq!(erase.code, 1);
    assert!(server.list().await.is_empty());

    let id = server.submit("a.png", &png(1)).await.json::<SubmitResponse>().await.unwrap().id;
    assert_eq!(id, 3);
}

#[rstest]
#[tokio::test]
async fn test_metrics(#[future] server: TestServer) {
    let server = server.await;
    server.submit("a.png", &png(1)).await;
    server.submit("a.png", &png(1)).await;

    let body = server.client.get(server.url("/metrics")).send().await.unwrap().text().await.unwrap();
    assert!(body.contains("imembed_cache_lookup_count"));
}

#[rstest]
#[tokio::test]
async fn test_upload_dedup(#[future] server: TestServer) {
    let server = server.await;
    let form = Form::new()
        .part("file", Part::bytes(png(1)).file_name("a.png"))
        .part("file", Part::bytes(png(1)).file_name("b.png"))
        .part("file", Part::bytes(png(2)).file_name("c.png"));

    let resp = server.client.post(server.url("/images/upload")).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.json::<IdsResponse>().await.unwrap().ids, vec![1, 1, 2]);

    let view = server
        .client
        .get(server.url("/images/2"))
        .send()
        .await
        .unwrap()
        .json::<ImageView>()
        .await
        .unwrap();
    assert_eq!(view.name, "c.png");
    assert_eq!(server.list().await, vec![1, 2]);
}

#[rstest]
#[tokio::test]
async fn test_upload_requires_filename(#[future] server: TestServer) {
    let server = server.await;
    let form = Form::new().part("file", Part::bytes(png(1)));

    let resp = server.client.post(server.url("/images/upload")).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(server.list().await.is_empty());
}
