mod common;

use common::{image_row, setup_env, spawn_server};
use serde_json::{json, Value};

#[tokio::test]
async fn test_health() {
    let env = setup_env();
    let client = spawn_server(env.state()).await;
    let resp = client.get("/health").await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["media_count"], 0);
}

#[tokio::test]
async fn test_photos_page_shape() {
    let env = setup_env();
    let newer = env.png("Camera", "newer.png", 6, 4);
    let older = env.png("Camera", "older.png", 6, 4);
    let id_newer = env.insert(&image_row(&newer, "Camera", 2_000_000));
    env.insert(&image_row(&older, "Camera", 1_000_000));
    let client = spawn_server(env.state()).await;

    let resp = client
        .get("/photos?first=1&assetType=Photos&include=filename,imageSize,albums,bogus")
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["page_info"]["has_next_page"], true);
    assert_eq!(body["page_info"]["end_cursor"], "1");
    let node = &body["edges"][0]["node"];
    assert_eq!(node["id"], id_newer.to_string());
    assert_eq!(node["type"], "image/png");
    assert_eq!(node["group_name"], json!(["Camera"]));
    assert_eq!(node["timestamp"], 2000.0);
    assert_eq!(node["image"]["filename"], "newer.png");
    assert_eq!(node["image"]["width"], 6);
    assert_eq!(node["image"]["height"], 4);
    assert!(node["image"]["fileSize"].is_null());
    assert!(node["location"].is_null());

    let resp = client.get("/photos?first=1&after=1").await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["page_info"]["has_next_page"], false);
    assert_eq!(body["edges"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_photos_json_body() {
    let env = setup_env();
    let p = env.png("Camera", "a.png", 2, 2);
    env.insert(&image_row(&p, "Camera", 1_000_000));
    let client = spawn_server(env.state()).await;

    let resp = client
        .post("/photos", &json!({"first": 5, "mimeTypes": ["image/png"], "include": ["fileSize"]}))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["edges"][0]["node"]["image"]["fileSize"], 1234);
}

#[tokio::test]
async fn test_photos_client_errors() {
    let env = setup_env();
    let client = spawn_server(env.state()).await;

    let resp = client.get("/photos?first=2&assetType=Music").await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_INVALID_FILTER");

    let resp = client.get("/photos?first=2&after=xyz").await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_INVALID_CURSOR");

    let resp = client.get("/photos").await.unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client.get("/photos?first=2&fromTime=10&toTime=5").await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_albums_endpoint() {
    let env = setup_env();
    env.insert(&image_row(&env.root.join("Pictures/a.jpg"), "Pictures", 1_000));
    let client = spawn_server(env.state()).await;

    let resp = client.get("/albums?assetType=Photos").await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!([{"title": "Pictures", "count": 1}]));

    let resp = client.get("/albums?assetType=nope").await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_malformed_numbers_get_error_bodies() {
    let env = setup_env();
    let client = spawn_server(env.state()).await;

    let resp = client.get("/photos?first=-1").await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_INVALID_PAGE_SIZE");

    let resp = client.get("/photos?first=2&fromTime=abc").await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_INVALID_FILTER");

    let resp = client.post("/photos", &json!({"first": "two"})).await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_INVALID_PAGE_SIZE");

    let resp = client.post("/photos", &json!({"first": 2, "mimeTypes": "image/png"})).await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_INVALID_FILTER");
}

#[tokio::test]
async fn test_photo_by_id_endpoint() {
    let env = setup_env();
    let good = env.png("Camera", "good.png", 5, 7);
    let bad = env.garbage("Camera", "bad.png");
    let id_good = env.insert(&image_row(&good, "Camera", 2_000_000));
    let id_bad = env.insert(&image_row(&bad, "Camera", 1_000_000));
    let client = spawn_server(env.state()).await;

    let resp = client.get(&format!("/photos/{}?include=imageSize,filename", id_good)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["node"]["id"], id_good.to_string());
    assert_eq!(body["node"]["image"]["width"], 5);
    assert_eq!(body["node"]["image"]["height"], 7);
    assert_eq!(body["node"]["image"]["filename"], "good.png");

    let resp = client.get(&format!("/photos/{}?include=imageSize", id_bad)).await.unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_ASSET_UNAVAILABLE");

    // without the size requested the unreadable file is still served
    let resp = client.get(&format!("/photos/{}", id_bad)).await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client.get("/photos/999999").await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "E_NOT_FOUND");
}
