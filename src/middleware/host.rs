use axum::extract::{Request, State};
use axum::http::uri::Uri;
use axum::middleware::Next;
use axum::response::Response;

use crate::state::SharedState;

/// Hostname-based tenant routing: requests for the app domain (or its
/// www. variant, or plain localhost) pass through untouched; any other
/// hostname is rewritten to `/sites/{hostname}{path}` so the tenant
/// renderer handles it. The browser URL is unaffected.
pub async fn rewrite_tenant_hosts(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Response {
    let hostname = req
        .headers()
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .split(':')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    // API, lead capture, uploads and health are host-agnostic: tenant
    // pages call them relative to their own domain.
    if is_app_host(&hostname, &state.config.app_domain) || !should_rewrite(req.uri().path()) {
        return next.run(req).await;
    }

    // Trailing slashes (and the bare root) would dodge the /sites routes.
    let path = req.uri().path().trim_end_matches('/').to_string();
    let query = req
        .uri()
        .query()
        .map(|q| format!("?{q}"))
        .unwrap_or_default();

    let rewritten = format!("/sites/{hostname}{path}{query}");
    match rewritten.parse::<Uri>() {
        Ok(uri) => *req.uri_mut() = uri,
        Err(e) => {
            tracing::warn!("Failed to rewrite tenant host {hostname}: {e}");
        }
    }

    next.run(req).await
}

fn is_app_host(hostname: &str, app_domain: &str) -> bool {
    hostname.is_empty()
        || hostname == app_domain
        || hostname == format!("www.{app_domain}")
        || hostname == "localhost"
        || hostname == "127.0.0.1"
}

fn should_rewrite(path: &str) -> bool {
    !(path.starts_with("/api/")
        || path.starts_with("/v1/")
        || path.starts_with("/uploads/")
        || path.starts_with("/sites/")
        || path == "/health")
}

#[cfg(test)]
mod tests {
    use super::is_app_host;

    #[test]
    fn app_domain_and_www_pass_through() {
        assert!(is_app_host("themeforge.app", "themeforge.app"));
        assert!(is_app_host("www.themeforge.app", "themeforge.app"));
        assert!(is_app_host("localhost", "themeforge.app"));
    }

    #[test]
    fn tenant_domains_are_rewritten() {
        assert!(!is_app_host("shopgiay.com", "themeforge.app"));
        assert!(!is_app_host("beans.themeforge.app", "themeforge.app"));
    }

    #[test]
    fn host_agnostic_paths_are_not_rewritten() {
        assert!(!super::should_rewrite("/api/v1/projects"));
        assert!(!super::should_rewrite("/v1/leads"));
        assert!(!super::should_rewrite("/uploads/x.png"));
        assert!(!super::should_rewrite("/health"));
        assert!(super::should_rewrite("/"));
        assert!(super::should_rewrite("/products"));
    }
}
