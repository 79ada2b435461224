mod common;

use reqwest::StatusCode;
use serde_json::json;

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    common::cleanup(app).await;
}

// ── Registration & Auth ─────────────────────────────────────────

#[tokio::test]
async fn register_returns_tokens() {
    let app = common::spawn_app().await;

    let (body, status) = app.register("user@test.com", "password123", "User").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = common::spawn_app().await;
    app.signup("user@test.com").await;

    let (_, status) = app.register("user@test.com", "password123", "Again").await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = common::spawn_app().await;

    let (_, status) = app.register("user@test.com", "short", "User").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = common::spawn_app().await;
    app.signup("user@test.com").await;

    let (_, status) = app.login("user@test.com", "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn refresh_token_rotation_and_reuse_detection() {
    let app = common::spawn_app().await;
    app.signup("user@test.com").await;
    let (login_body, _) = app.login("user@test.com", "password123").await;
    let refresh = login_body["refresh_token"].as_str().unwrap();

    // First refresh succeeds and rotates
    let resp = app
        .client
        .post(app.url("/api/v1/auth/refresh"))
        .header("cookie", format!("refresh_token={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_ne!(body["refresh_token"].as_str().unwrap(), refresh);

    // Replaying the old token revokes all sessions
    let resp2 = app
        .client
        .post(app.url("/api/v1/auth/refresh"))
        .header("cookie", format!("refresh_token={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp2.status(), StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn protected_route_requires_token() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/api/v1/projects"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

// ── Themes ──────────────────────────────────────────────────────

#[tokio::test]
async fn theme_creation_requires_admin() {
    let app = common::spawn_app().await;
    let token = app.signup("user@test.com").await;

    let (_, status) = app
        .post_auth(
            "/api/v1/themes",
            &token,
            &json!({ "name": "Nope", "default_params": {} }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn admin_can_crud_themes() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;

    let theme = app.create_theme(&admin, "Corporate").await;
    let theme_id = theme["id"].as_str().unwrap();

    let (listed, status) = app.get_auth("/api/v1/themes", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (updated, status) = app
        .put_auth(
            &format!("/api/v1/themes/{theme_id}"),
            &admin,
            &json!({
                "name": "Corporate v2",
                "description": "updated",
                "default_params": { "colors": { "primary": "#000000" } }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Corporate v2");

    let (_, status) = app
        .delete_auth(&format!("/api/v1/themes/{theme_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

// ── Projects & versions ─────────────────────────────────────────

#[tokio::test]
async fn project_creation_seeds_first_version() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Base").await;
    let token = app.signup("user@test.com").await;

    let project = app
        .create_project(&token, theme["id"].as_str().unwrap(), "My Site")
        .await;
    assert_eq!(project["latest_version"]["version_number"], 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn project_update_appends_monotonic_versions() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Base").await;
    let token = app.signup("user@test.com").await;
    let project = app
        .create_project(&token, theme["id"].as_str().unwrap(), "My Site")
        .await;
    let project_id = project["id"].as_str().unwrap();

    for expected in 2..=4 {
        let (body, status) = app
            .put_auth(
                &format!("/api/v1/projects/{project_id}"),
                &token,
                &json!({ "theme_params": { "colors": { "primary": "#111111" } } }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "update failed: {body}");
        assert_eq!(body["latest_version"]["version_number"], expected);
    }

    let (versions, status) = app
        .get_auth(&format!("/api/v1/projects/{project_id}/versions"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<i64> = versions
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["version_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![4, 3, 2, 1]);

    common::cleanup(app).await;
}

#[tokio::test]
async fn free_tier_caps_projects_at_three() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Base").await;
    let token = app.signup("user@test.com").await;
    let theme_id = theme["id"].as_str().unwrap();

    for i in 0..3 {
        app.create_project(&token, theme_id, &format!("Site {i}")).await;
    }

    let (body, status) = app
        .post_auth(
            "/api/v1/projects",
            &token,
            &json!({ "theme_id": theme_id, "name": "One too many" }),
        )
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED, "expected tier gate: {body}");

    common::cleanup(app).await;
}

#[tokio::test]
async fn paid_user_can_exceed_free_project_cap() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Base").await;
    let token = app.signup("user@test.com").await;
    app.grant_paid_amount("user@test.com", 299_000).await;
    let theme_id = theme["id"].as_str().unwrap();

    for i in 0..4 {
        app.create_project(&token, theme_id, &format!("Site {i}")).await;
    }

    let (tier, status) = app.get_auth("/api/v1/tier", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tier["tier"], "standard");

    common::cleanup(app).await;
}

#[tokio::test]
async fn users_cannot_see_each_others_projects() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Base").await;
    let owner = app.signup("owner@test.com").await;
    let other = app.signup("other@test.com").await;

    let project = app
        .create_project(&owner, theme["id"].as_str().unwrap(), "Private Site")
        .await;
    let project_id = project["id"].as_str().unwrap();

    let (_, status) = app
        .get_auth(&format!("/api/v1/projects/{project_id}"), &other)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

// ── Domains ─────────────────────────────────────────────────────

#[tokio::test]
async fn domain_claims_collide_across_projects() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Base").await;
    let token = app.signup("user@test.com").await;
    let theme_id = theme["id"].as_str().unwrap();

    let first = app.create_project(&token, theme_id, "First").await;
    let second = app.create_project(&token, theme_id, "Second").await;

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/projects/{}/domain", first["id"].as_str().unwrap()),
            &token,
            &json!({ "subdomain": "beans" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "claim failed: {body}");

    let (_, status) = app
        .put_auth(
            &format!("/api/v1/projects/{}/domain", second["id"].as_str().unwrap()),
            &token,
            &json!({ "subdomain": "beans" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (check, status) = app
        .get_auth("/api/v1/check-domain?domain=beans", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["available"], false);

    common::cleanup(app).await;
}

#[tokio::test]
async fn invalid_domains_are_rejected() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Base").await;
    let token = app.signup("user@test.com").await;
    let project = app
        .create_project(&token, theme["id"].as_str().unwrap(), "Site")
        .await;

    let (_, status) = app
        .put_auth(
            &format!("/api/v1/projects/{}/domain", project["id"].as_str().unwrap()),
            &token,
            &json!({ "custom_domain": "Bad Domain!" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

// ── Payments & webhook ──────────────────────────────────────────

#[tokio::test]
async fn checkout_creates_pending_payment() {
    let app = common::spawn_app().await;
    let token = app.signup("user@test.com").await;

    let (body, status) = app
        .post_auth(
            "/api/v1/payments",
            &token,
            &json!({ "amount": 299000, "currency": "VND", "plan_id": "standard" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert!(body["bank_txn_id"].as_str().unwrap().starts_with("TXN_"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn webhook_rejects_bad_key() {
    let app = common::spawn_app().await;

    let payload = json!({
        "gateway": "TestBank", "transferType": "in",
        "transferAmount": 1000, "referenceCode": "TXN_X"
    });

    let (_, status) = app.webhook(None, &payload).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, status) = app.webhook(Some("Apikey wrong"), &payload).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn webhook_flow_marks_paid_and_upgrades_tier() {
    let app = common::spawn_app().await;
    let token = app.signup("user@test.com").await;

    let (payment, _) = app
        .post_auth(
            "/api/v1/payments",
            &token,
            &json!({ "amount": 599000, "currency": "VND", "plan_id": "pro" }),
        )
        .await;
    let reference = payment["bank_txn_id"].as_str().unwrap();

    // Unknown reference
    let (_, status) = app
        .webhook(
            Some("Apikey test-webhook-key"),
            &json!({
                "gateway": "TestBank", "transferType": "in",
                "transferAmount": 599000, "referenceCode": "TXN_UNKNOWN"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Amount mismatch
    let (_, status) = app
        .webhook(
            Some("Apikey test-webhook-key"),
            &json!({
                "gateway": "TestBank", "transferType": "in",
                "transferAmount": 1, "referenceCode": reference
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Outgoing transfers are acknowledged but ignored
    let (body, status) = app
        .webhook(
            Some("Apikey test-webhook-key"),
            &json!({
                "gateway": "TestBank", "transferType": "out",
                "transferAmount": 599000, "referenceCode": reference
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Outgoing transfer ignored");

    // Valid confirmation
    let payload = json!({
        "gateway": "TestBank", "transferType": "in",
        "transferAmount": 599000, "referenceCode": reference
    });
    let (body, status) = app.webhook(Some("Apikey test-webhook-key"), &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paid");

    // Replay is idempotent
    let (body, status) = app.webhook(Some("Apikey test-webhook-key"), &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_processed"], true);

    // Paid 599k in the window -> pro tier
    let (tier, _) = app.get_auth("/api/v1/tier", &token).await;
    assert_eq!(tier["tier"], "pro");

    common::cleanup(app).await;
}

// ── Leads ───────────────────────────────────────────────────────

#[tokio::test]
async fn public_lead_capture_and_owner_listing() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Base").await;
    let token = app.signup("owner@test.com").await;
    let project = app
        .create_project(&token, theme["id"].as_str().unwrap(), "Site")
        .await;
    let project_id = project["id"].as_str().unwrap();

    // Public submit, no auth
    let resp = app
        .client
        .post(app.url("/v1/leads"))
        .json(&json!({
            "projectId": project_id,
            "name": "Jamie",
            "email": "jamie@example.com",
            "company": "Acme",
            "message": "Interested in a quote"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );

    // Missing email rejected
    let resp = app
        .client
        .post(app.url("/v1/leads"))
        .json(&json!({ "projectId": project_id, "name": "No Email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Form-encoded body also accepted
    let resp = app
        .client
        .post(app.url("/v1/leads"))
        .form(&[
            ("projectId", project_id),
            ("name", "Form Lead"),
            ("email", "form@example.com"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Owner sees both leads
    let (leads, status) = app
        .get_auth(&format!("/api/v1/projects/{project_id}/leads"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(leads.as_array().unwrap().len(), 2);

    // Other users cannot list them
    let other = app.signup("other@test.com").await;
    let (_, status) = app
        .get_auth(&format!("/api/v1/projects/{project_id}/leads"), &other)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

// ── Tenant sites ────────────────────────────────────────────────

#[tokio::test]
async fn tenant_site_renders_latest_snapshot() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Highland Beans").await;
    let token = app.signup("owner@test.com").await;
    let project = app
        .create_project(&token, theme["id"].as_str().unwrap(), "Beans Site")
        .await;
    let project_id = project["id"].as_str().unwrap();

    app.put_auth(
        &format!("/api/v1/projects/{project_id}/domain"),
        &token,
        &json!({ "subdomain": "beans" }),
    )
    .await;

    // Push a recognizable snapshot
    let (_, status) = app
        .put_auth(
            &format!("/api/v1/projects/{project_id}"),
            &token,
            &json!({ "theme_params": {
                "colors": { "primary": "#8B4513" },
                "content": { "hero": { "title": "Coffee from Dalat" } }
            }}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let resp = app
        .client
        .get(app.url("/sites/beans.themeforge.test"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Coffee from Dalat"));
    assert!(html.contains("#8B4513"));

    // Unknown domains render the branded 404
    let resp = app
        .client
        .get(app.url("/sites/nobody.example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

// ── Generation ──────────────────────────────────────────────────

#[tokio::test]
async fn generation_without_credentials_is_upstream_error() {
    let app = common::spawn_app().await;
    let token = app.signup("user@test.com").await;

    let (body, status) = app
        .post_auth(
            "/api/v1/generate-theme",
            &token,
            &json!({ "businessInfo": {
                "companyName": "Acme", "industry": "tech",
                "description": "d", "language": "english"
            }}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "body: {body}");

    common::cleanup(app).await;
}

#[tokio::test]
async fn generation_is_rate_limited_per_tier() {
    let app = common::spawn_app().await;
    let token = app.signup("user@test.com").await;

    let payload = json!({ "businessInfo": {
        "companyName": "Acme", "industry": "tech",
        "description": "d", "language": "english"
    }});

    // Free tier: 10 requests/min pass the limiter (they fail upstream,
    // which still consumes the budget), the 11th is limited.
    for _ in 0..10 {
        let (_, status) = app.post_auth("/api/v1/generate-theme", &token, &payload).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
    let (_, status) = app.post_auth("/api/v1/generate-theme", &token, &payload).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    common::cleanup(app).await;
}

// ── Uploads ─────────────────────────────────────────────────────

#[tokio::test]
async fn upload_validates_type_and_round_trips() {
    let app = common::spawn_app().await;
    let token = app.signup("user@test.com").await;

    let png = reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4E, 0x47, 0, 0, 0, 0])
        .file_name("logo.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", png);

    let resp = app
        .client
        .post(app.url("/api/v1/uploads"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    let file_name = body["file_name"].as_str().unwrap().to_string();
    assert!(body["url"].as_str().unwrap().starts_with("/uploads/"));

    // Served back by the static file service
    let resp = app
        .client
        .get(app.url(&format!("/uploads/{file_name}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Disallowed type
    let exe = reqwest::multipart::Part::bytes(vec![0x4D, 0x5A])
        .file_name("evil.exe")
        .mime_str("application/octet-stream")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", exe);
    let resp = app
        .client
        .post(app.url("/api/v1/uploads"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Delete
    let (_, status) = app
        .delete_auth(&format!("/api/v1/uploads/{file_name}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

// ── Export ──────────────────────────────────────────────────────

#[tokio::test]
async fn export_writes_static_bundle() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Base").await;
    let token = app.signup("user@test.com").await;
    let project = app
        .create_project(&token, theme["id"].as_str().unwrap(), "Export Me")
        .await;
    let project_id = project["id"].as_str().unwrap();

    let (body, status) = app
        .post_auth(&format!("/api/v1/projects/{project_id}/export"), &token, &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "export failed: {body}");

    let files: Vec<String> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap().to_string())
        .collect();
    assert!(files.contains(&"index.html".to_string()));
    assert!(files.contains(&"sitemap.xml".to_string()));

    let export_dir = body["export_dir"].as_str().unwrap();
    assert!(std::path::Path::new(export_dir).join("index.html").exists());

    common::cleanup(app).await;
}

// ── Deploy gating ───────────────────────────────────────────────

#[tokio::test]
async fn free_tier_cannot_deploy() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    let theme = app.create_theme(&admin, "Base").await;
    let token = app.signup("user@test.com").await;
    let project = app
        .create_project(&token, theme["id"].as_str().unwrap(), "Site")
        .await;
    let project_id = project["id"].as_str().unwrap();

    // The tier gate fires before any integration or network call.
    let (body, status) = app
        .post_auth(
            &format!("/api/v1/projects/{project_id}/deploy/github"),
            &token,
            &json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED, "body: {body}");

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/projects/{project_id}/deploy/vercel"),
            &token,
            &json!({ "repo_full_name": "owner/repo" }),
        )
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED, "body: {body}");

    common::cleanup(app).await;
}

// ── Admin ───────────────────────────────────────────────────────

#[tokio::test]
async fn admin_endpoints_require_admin_role() {
    let app = common::spawn_app().await;
    let token = app.signup("user@test.com").await;

    let (_, status) = app.get_auth("/api/v1/admin/users", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn admin_sees_users_with_tier_aggregates() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    app.signup("user@test.com").await;
    app.grant_paid_amount("user@test.com", 600_000).await;

    let (users, status) = app.get_auth("/api/v1/admin/users", &admin).await;
    assert_eq!(status, StatusCode::OK);

    let user = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "user@test.com")
        .expect("user missing from admin listing");
    assert_eq!(user["tier"], "pro");
    assert_eq!(user["paid_total_30d"], 600_000);

    common::cleanup(app).await;
}

#[tokio::test]
async fn admin_password_reset_flow() {
    let app = common::spawn_app().await;
    let admin = app.signup_admin("admin@test.com").await;
    app.signup("user@test.com").await;

    let (users, _) = app.get_auth("/api/v1/admin/users", &admin).await;
    let user_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "user@test.com")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (body, status) = app
        .post_auth(
            &format!("/api/v1/admin/users/{user_id}/reset-password"),
            &admin,
            &json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let reset_token = body["reset_token"].as_str().unwrap();

    let resp = app
        .client
        .post(app.url("/api/v1/auth/reset-password"))
        .json(&json!({ "token": reset_token, "password": "newpassword1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, status) = app.login("user@test.com", "newpassword1").await;
    assert_eq!(status, StatusCode::OK);
    let (_, status) = app.login("user@test.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}
