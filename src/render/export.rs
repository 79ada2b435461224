use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use super::{build_view, generate_css, render_page, site_js};

/// A static-site bundle: relative path -> file content. The same map is
/// written to disk for downloads and pushed file-by-file to GitHub.
pub struct ExportBundle {
    pub files: BTreeMap<String, String>,
}

impl ExportBundle {
    /// Relative paths of the bundled files.
    pub fn manifest(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// Write the bundle under `dir`, creating it as needed.
    pub async fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, String> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| format!("Failed to create export directory: {e}"))?;

        for (rel_path, content) in &self.files {
            let path = dir.join(rel_path);
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| format!("Failed to write {rel_path}: {e}"))?;
        }

        Ok(dir.to_path_buf())
    }
}

/// Build the full bundle for a project snapshot.
pub fn build_bundle(
    project_name: &str,
    project_id: &str,
    snapshot: &Value,
    site_url: &str,
    leads_endpoint: &str,
) -> Result<ExportBundle, String> {
    let view = build_view(project_name, project_id, snapshot, false, leads_endpoint);
    let index_html = render_page(&view)?;

    let mut files = BTreeMap::new();
    files.insert("index.html".to_string(), index_html);
    files.insert("styles.css".to_string(), generate_css(snapshot));
    files.insert("site.js".to_string(), site_js());
    files.insert("sitemap.xml".to_string(), sitemap(site_url));
    files.insert("robots.txt".to_string(), robots(site_url));
    files.insert(
        "manifest.webmanifest".to_string(),
        manifest(project_name, snapshot),
    );
    files.insert("README.md".to_string(), readme(project_name));

    Ok(ExportBundle { files })
}

fn sitemap(site_url: &str) -> String {
    let today = Utc::now().format("%Y-%m-%d");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>{site_url}/</loc>
    <lastmod>{today}</lastmod>
    <changefreq>weekly</changefreq>
    <priority>1.0</priority>
  </url>
</urlset>
"#
    )
}

fn robots(site_url: &str) -> String {
    format!("User-agent: *\nAllow: /\n\nSitemap: {site_url}/sitemap.xml\n")
}

fn manifest(project_name: &str, snapshot: &Value) -> String {
    let theme_color = snapshot["colors"]["primary"].as_str().unwrap_or("#2563eb");
    let background = snapshot["colors"]["background"]
        .as_str()
        .unwrap_or("#ffffff");
    serde_json::json!({
        "name": project_name,
        "short_name": project_name,
        "start_url": "/",
        "display": "standalone",
        "theme_color": theme_color,
        "background_color": background,
    })
    .to_string()
}

fn readme(project_name: &str) -> String {
    format!(
        "# {project_name}\n\nStatic website exported from Themeforge.\n\n\
         Serve the directory with any static file host, for example:\n\n\
         ```sh\npython3 -m http.server 8080\n```\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bundle_contains_expected_files() {
        let bundle = build_bundle(
            "Highland Beans",
            "pid",
            &json!({"colors": {"primary": "#8B4513"}}),
            "https://beans.example",
            "https://app.example/v1/leads",
        )
        .unwrap();

        let manifest = bundle.manifest();
        for expected in [
            "index.html",
            "styles.css",
            "site.js",
            "sitemap.xml",
            "robots.txt",
            "manifest.webmanifest",
            "README.md",
        ] {
            assert!(manifest.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn sitemap_points_at_site_url() {
        let bundle = build_bundle(
            "P",
            "pid",
            &json!({}),
            "https://beans.example",
            "/v1/leads",
        )
        .unwrap();
        assert!(bundle.files["sitemap.xml"].contains("https://beans.example/"));
        assert!(bundle.files["robots.txt"].contains("https://beans.example/sitemap.xml"));
    }

    #[test]
    fn manifest_uses_theme_colors() {
        let bundle = build_bundle(
            "P",
            "pid",
            &json!({"colors": {"primary": "#123456"}}),
            "https://x.example",
            "/v1/leads",
        )
        .unwrap();
        assert!(bundle.files["manifest.webmanifest"].contains("#123456"));
    }

    #[tokio::test]
    async fn bundle_writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = build_bundle("P", "pid", &json!({}), "https://x.example", "/v1/leads")
            .unwrap();
        bundle.write_to_dir(dir.path()).await.unwrap();
        assert!(dir.path().join("index.html").exists());
        assert!(dir.path().join("README.md").exists());
    }
}
