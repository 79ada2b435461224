use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use themeforge::config::Config;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register a user and return their access token.
    pub async fn signup(&self, email: &str) -> String {
        let (body, status) = self.register(email, "password123", "Test User").await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Register a user, promote them to admin in the database, and log in
    /// again so the token carries the admin role.
    pub async fn signup_admin(&self, email: &str) -> String {
        self.signup(email).await;
        sqlx::query("UPDATE users SET role = 'admin' WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .expect("failed to promote admin");
        let (body, status) = self.login(email, "password123").await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Create a theme as the given admin, return the theme JSON.
    pub async fn create_theme(&self, admin_token: &str, name: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/themes",
                admin_token,
                &json!({
                    "name": name,
                    "description": "test theme",
                    "default_params": {
                        "colors": { "primary": "#2563eb", "background": "#ffffff" },
                        "typography": { "fontFamily": "Inter" },
                        "content": { "header": { "title": name } }
                    }
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create theme failed: {body}");
        body
    }

    /// Create a project, return the project JSON.
    pub async fn create_project(&self, token: &str, theme_id: &str, name: &str) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/projects",
                token,
                &json!({ "theme_id": theme_id, "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create project failed: {body}");
        body
    }

    /// Insert a paid payment directly so tier derivation picks it up.
    pub async fn grant_paid_amount(&self, email: &str, amount: i64) {
        sqlx::query(
            "INSERT INTO payments (user_id, amount, currency, status, bank_txn_id, paid_at)
             SELECT id, $2, 'VND', 'paid', $3, now() FROM users WHERE email = $1",
        )
        .bind(email)
        .bind(amount)
        .bind(format!("TXN_TEST_{}", Uuid::now_v7().simple()))
        .execute(&self.pool)
        .await
        .expect("failed to insert paid payment");
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Send a webhook payload with the given API key header value.
    pub async fn webhook(&self, auth_header: Option<&str>, payload: &Value) -> (Value, StatusCode) {
        let mut req = self.client.post(self.url("/api/v1/payments/webhook"));
        if let Some(header) = auth_header {
            req = req.header("authorization", header);
        }
        let resp = req.json(payload).send().await.expect("webhook failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!(
        "themeforge_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let scratch = std::env::temp_dir().join(&db_name);

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        app_domain: "themeforge.test".to_string(),
        max_body_size: 1_048_576,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
        upload_dir: scratch.join("uploads").to_string_lossy().to_string(),
        max_upload_size: 1_048_576,
        export_dir: scratch.join("exports").to_string_lossy().to_string(),
        payment_webhook_key: "test-webhook-key".to_string(),
        ai_api_keys: vec![],
        ai_model: "gemini-2.5-flash".to_string(),
        unsplash_access_key: None,
        github: None,
        vercel: None,
    };

    let state = themeforge::build_state(pool.clone(), config);
    let app = themeforge::build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
