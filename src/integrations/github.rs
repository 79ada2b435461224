use std::collections::BTreeMap;
use std::time::Duration;

use base64::prelude::{Engine, BASE64_STANDARD};
use serde::Serialize;
use serde_json::json;

use crate::config::GithubConfig;

const API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone, Serialize)]
pub struct RepoInfo {
    pub repo_url: String,
    pub repo_full_name: String,
    pub default_branch: String,
}

/// Thin client over the GitHub REST API: create a repository and push a
/// file map via the contents endpoint.
pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    owner: String,
    base_url: String,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Self {
        Self::with_base_url(config, API_BASE)
    }

    pub fn with_base_url(config: &GithubConfig, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent("themeforge")
                .build()
                .expect("Failed to build GitHub client"),
            token: config.token.clone(),
            owner: config.owner.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn repo_exists(&self, repo_name: &str) -> Result<bool, String> {
        let url = format!("{}/repos/{}/{}", self.base_url, self.owner, repo_name);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|e| format!("GitHub request failed: {e}"))?;

        match response.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(format!("GitHub repo check failed with status {status}")),
        }
    }

    pub async fn create_repo(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> Result<RepoInfo, String> {
        let url = format!("{}/user/repos", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.v3+json")
            .json(&json!({
                "name": name,
                "description": description,
                "private": private,
                "auto_init": true,
            }))
            .send()
            .await
            .map_err(|e| format!("GitHub request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("Failed to create GitHub repo ({status}): {detail}"));
        }

        let repo: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("Invalid GitHub response: {e}"))?;

        Ok(RepoInfo {
            repo_url: repo["html_url"].as_str().unwrap_or_default().to_string(),
            repo_full_name: repo["full_name"].as_str().unwrap_or_default().to_string(),
            default_branch: repo["default_branch"]
                .as_str()
                .unwrap_or("main")
                .to_string(),
        })
    }

    /// Push files one by one through the contents API. Existing files are
    /// updated with their current blob sha.
    pub async fn push_files(
        &self,
        repo_full_name: &str,
        files: &BTreeMap<String, String>,
        commit_message: &str,
    ) -> Result<(), String> {
        for (path, content) in files {
            let url = format!("{}/repos/{}/contents/{}", self.base_url, repo_full_name, path);

            let existing_sha = {
                let response = self
                    .http
                    .get(&url)
                    .bearer_auth(&self.token)
                    .header("Accept", "application/vnd.github.v3+json")
                    .send()
                    .await
                    .map_err(|e| format!("GitHub request failed: {e}"))?;
                if response.status().is_success() {
                    response
                        .json::<serde_json::Value>()
                        .await
                        .ok()
                        .and_then(|v| v["sha"].as_str().map(|s| s.to_string()))
                } else {
                    None
                }
            };

            let mut body = json!({
                "message": commit_message,
                "content": BASE64_STANDARD.encode(content.as_bytes()),
            });
            if let Some(sha) = existing_sha {
                body["sha"] = json!(sha);
            }

            let response = self
                .http
                .put(&url)
                .bearer_auth(&self.token)
                .header("Accept", "application/vnd.github.v3+json")
                .json(&body)
                .send()
                .await
                .map_err(|e| format!("GitHub request failed: {e}"))?;

            if !response.status().is_success() {
                let status = response.status();
                return Err(format!("Failed to push {path} ({status})"));
            }
        }

        tracing::info!(
            "Pushed {} files to {}",
            files.len(),
            repo_full_name
        );
        Ok(())
    }
}

