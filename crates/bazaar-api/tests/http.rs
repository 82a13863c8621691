use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use bazaar_api::images::DiskImageStore;
use bazaar_api::state::{AppStateInner, AuthConfig};
use bazaar_api::validation::PicturePolicy;
use bazaar_db::Database;

const BOUNDARY: &str = "bazaar-test-boundary";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

struct TestApp {
    router: Router,
    upload_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

impl TestApp {
    async fn new() -> Self {
        let upload_dir = std::env::temp_dir().join(format!("bazaar_http_{}", Uuid::new_v4()));
        let images = DiskImageStore::new(upload_dir.clone(), "http://localhost:8000")
            .await
            .unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());
        let auth = AuthConfig {
            jwt_secret: "integration-test-secret".into(),
            token_ttl_days: 1,
        };
        let state = AppStateInner::new(db, Arc::new(images), auth, PicturePolicy::default());
        Self {
            router: bazaar_api::router(state),
            upload_dir,
        }
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Register a user and return (user_id, token).
    async fn register(&self, email: &str) -> (i64, String) {
        let req = json_request(
            "POST",
            "/auth/register",
            None,
            json!({ "email": email, "password": "hunter22", "name": "Tester" }),
        );
        let (status, body) = self.send(req).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (body["user_id"].as_i64().unwrap(), body["token"].as_str().unwrap().to_string())
    }

    async fn create_chair(&self, token: &str) -> Value {
        let (status, body) = self
            .send(multipart_request("POST", "/product", token, &chair_fields(), &[("chair.png", "image/png", PNG)]))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["product"].clone()
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

fn chair_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("name", "Chair"),
        ("price", "100"),
        ("category", "Furniture"),
        ("description", "x"),
    ]
}

fn multipart_request(
    method: &str,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (file_name, content_type, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"pictures\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn create_chair_with_one_picture() {
    let app = TestApp::new().await;
    let (seller, token) = app.register("seller@example.com").await;

    let product = app.create_chair(&token).await;
    assert_eq!(product["name"], "Chair");
    assert_eq!(product["price"], 100);
    assert_eq!(product["category"], "Furniture");
    assert_eq!(product["seller_id"], seller);
    assert_eq!(product["pictures"].as_array().unwrap().len(), 1);

    let file = product["pictures"][0].as_str().unwrap();
    assert!(app.upload_dir.join(file).exists());

    let (status, body) = app.send(empty_request("GET", "/product", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["products"].as_array().unwrap().len(), 1);

    let uri = format!("/product/{}", product["id"]);
    let (status, body) = app.send(empty_request("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["id"], product["id"]);
    assert!(body["product"]["createdAt"].is_string());
}

#[tokio::test]
async fn invalid_inputs_map_to_typed_errors() {
    let app = TestApp::new().await;
    let (_, token) = app.register("seller@example.com").await;

    let (status, body) = app.send(empty_request("GET", "/product/abc", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "VALIDATION_FAILED");
    assert_eq!(body["message"], "Valid Product ID is required");

    let (status, body) = app.send(empty_request("DELETE", "/product/9999", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["type"], "NOT_FOUND");

    let mut fields = chair_fields();
    fields[2] = ("category", "invalid");
    let (status, body) = app
        .send(multipart_request("POST", "/product", &token, &fields, &[("a.png", "image/png", PNG)]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Valid category name is required");

    let (status, body) = app
        .send(multipart_request(
            "POST",
            "/product",
            &token,
            &chair_fields(),
            &[("a.png", "image/png", PNG), ("product.txt", "text/plain", &b"hello"[..])],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("product.txt"));

    // Neither rejected create left anything behind
    let (_, body) = app.send(empty_request("GET", "/product", None)).await;
    assert!(body["products"].as_array().unwrap().is_empty());
    assert_eq!(std::fs::read_dir(&app.upload_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(empty_request("GET", "/wishlist", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["type"], "UNAUTHORIZED");

    let (status, _) = app.send(empty_request("DELETE", "/product/1", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads stay public
    let (status, body) = app.send(empty_request("GET", "/category", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn bare_token_is_accepted() {
    let app = TestApp::new().await;
    let (_, token) = app.register("buyer@example.com").await;

    let req = Request::builder()
        .method("GET")
        .uri("/wishlist")
        .header(header::AUTHORIZATION, token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["wishlists"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn wishlist_add_twice_conflicts() {
    let app = TestApp::new().await;
    let (_, seller_token) = app.register("seller@example.com").await;
    let (buyer, buyer_token) = app.register("buyer@example.com").await;
    let product = app.create_chair(&seller_token).await;
    let uri = format!("/wishlist/{}", product["id"]);
    let check = format!("/wishlist/{}/check", product["id"]);

    let (status, body) = app.send(empty_request("POST", &uri, Some(&buyer_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wishlist"]["user_id"], buyer);
    assert_eq!(body["wishlist"]["product_id"], product["id"]);

    let (status, body) = app.send(empty_request("POST", &uri, Some(&buyer_token))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["type"], "ALREADY_EXISTS");

    let (_, body) = app.send(empty_request("GET", &check, Some(&buyer_token))).await;
    assert_eq!(body["isWishlist"], true);

    let (status, body) = app.send(empty_request("DELETE", &uri, Some(&buyer_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Wishlist successfully deleted");

    let (_, body) = app.send(empty_request("GET", &check, Some(&buyer_token))).await;
    assert_eq!(body["isWishlist"], false);

    let (status, body) = app.send(empty_request("DELETE", &uri, Some(&buyer_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Wishlist not found");
}

#[tokio::test]
async fn deleted_products_drop_out_of_wishlists() {
    let app = TestApp::new().await;
    let (_, seller_token) = app.register("seller@example.com").await;
    let (_, buyer_token) = app.register("buyer@example.com").await;
    let product = app.create_chair(&seller_token).await;

    let uri = format!("/wishlist/{}", product["id"]);
    app.send(empty_request("POST", &uri, Some(&buyer_token))).await;

    let (status, body) = app
        .send(empty_request("DELETE", &format!("/product/{}", product["id"]), Some(&seller_token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product Deleted");

    let (_, body) = app.send(empty_request("GET", "/wishlist", Some(&buyer_token))).await;
    assert!(body["wishlists"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn only_the_seller_can_change_a_product() {
    let app = TestApp::new().await;
    let (_, seller_token) = app.register("seller@example.com").await;
    let (_, other_token) = app.register("other@example.com").await;
    let product = app.create_chair(&seller_token).await;
    let uri = format!("/product/{}", product["id"]);

    let fields = [("category", "Hobby"), ("name", "Stolen")];
    let (status, body) = app.send(multipart_request("PUT", &uri, &other_token, &fields, &[])).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], "FORBIDDEN");

    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&other_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.send(empty_request("GET", &uri, None)).await;
    assert_eq!(body["product"]["name"], "Chair");

    let (status, body) = app.send(multipart_request("PUT", &uri, &seller_token, &fields, &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product Updated");
    assert_eq!(body["data"]["name"], "Stolen");
    assert_eq!(body["data"]["category"], "Hobby");
    assert_eq!(body["data"]["pictures"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_picture_part_keeps_current_pictures() {
    let app = TestApp::new().await;
    let (_, token) = app.register("seller@example.com").await;
    let product = app.create_chair(&token).await;
    let uri = format!("/product/{}", product["id"]);

    // A form with an unselected file input still sends the part
    let (status, body) = app
        .send(multipart_request(
            "PUT",
            &uri,
            &token,
            &[("category", "Hobby")],
            &[("", "application/octet-stream", &b""[..])],
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["category"], "Hobby");
    assert_eq!(body["data"]["pictures"], product["pictures"]);
    assert_eq!(std::fs::read_dir(&app.upload_dir).unwrap().count(), 1);
}

#[tokio::test]
async fn unknown_routes_and_methods_answer_with_json() {
    let app = TestApp::new().await;
    let (_, token) = app.register("seller@example.com").await;

    for method in ["PUT", "DELETE"] {
        let (status, body) = app.send(empty_request(method, "/product/", Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
        assert_eq!(body["type"], "NOT_FOUND");
    }

    let (status, body) = app.send(empty_request("GET", "/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");

    let (status, body) = app.send(empty_request("PATCH", "/product/1", Some(&token))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["type"], "METHOD_NOT_ALLOWED");

    let (status, body) = app.send(empty_request("GET", "/auth/login", None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["type"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn register_and_login() {
    let app = TestApp::new().await;
    let (user_id, _) = app.register("ada@example.com").await;

    let duplicate = json_request(
        "POST",
        "/auth/register",
        None,
        json!({ "email": "ada@example.com", "password": "hunter22", "name": "Ada" }),
    );
    let (status, body) = app.send(duplicate).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["type"], "ALREADY_EXISTS");

    let short = json_request(
        "POST",
        "/auth/register",
        None,
        json!({ "email": "bob@example.com", "password": "123", "name": "Bob" }),
    );
    let (status, _) = app.send(short).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let wrong = json_request(
        "POST",
        "/auth/login",
        None,
        json!({ "email": "ada@example.com", "password": "wrong-password" }),
    );
    let (status, body) = app.send(wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["type"], "UNAUTHORIZED");

    let login = json_request(
        "POST",
        "/auth/login",
        None,
        json!({ "email": "ada@example.com", "password": "hunter22" }),
    );
    let (status, body) = app.send(login).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["email"], "ada@example.com");
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn buyer_and_seller_chat() {
    let app = TestApp::new().await;
    let (seller, seller_token) = app.register("seller@example.com").await;
    let (buyer, buyer_token) = app.register("buyer@example.com").await;
    let (_, outsider_token) = app.register("outsider@example.com").await;

    let (status, body) = app
        .send(json_request("POST", "/chat", Some(&buyer_token), json!({ "seller_id": seller })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chat"]["buyer_id"], buyer);
    let chat_uri = format!("/chat/{}", body["chat"]["id"]);

    let (status, body) = app
        .send(json_request(
            "POST",
            &format!("{}/messages", chat_uri),
            Some(&buyer_token),
            json!({ "message": "Is the chair still available?" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["user_id"], buyer);

    let (status, body) = app.send(empty_request("GET", &chat_uri, Some(&seller_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chat"]["messages"].as_array().unwrap().len(), 1);

    let (status, _) = app.send(empty_request("GET", &chat_uri, Some(&outsider_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.send(empty_request("GET", "/chat", Some(&seller_token))).await;
    let chats = body["chats"].as_array().unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0]["last_message"]["message"], "Is the chair still available?");
}
