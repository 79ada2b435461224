use std::time::Duration;

use serde::Serialize;
use serde_json::json;

use crate::config::VercelConfig;

const API_BASE: &str = "https://api.vercel.com";

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentInfo {
    pub deployment_id: String,
    pub deployment_url: String,
    pub project_url: String,
}

/// Thin client over the Vercel API: link a project to a GitHub repo and
/// trigger a deployment from its default branch.
pub struct VercelClient {
    http: reqwest::Client,
    token: String,
    team_id: Option<String>,
    base_url: String,
}

impl VercelClient {
    pub fn new(config: &VercelConfig) -> Self {
        Self::with_base_url(config, API_BASE)
    }

    pub fn with_base_url(config: &VercelConfig, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build Vercel client"),
            token: config.token.clone(),
            team_id: config.team_id.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, url).bearer_auth(&self.token);
        if let Some(team) = &self.team_id {
            req = req.header("X-Vercel-Team-Id", team.clone());
        }
        req
    }

    /// Create the project if needed, returning its name. A conflict means
    /// the project already exists and is reused.
    pub async fn ensure_project(
        &self,
        project_name: &str,
        repo_full_name: &str,
    ) -> Result<String, String> {
        let response = self
            .request(reqwest::Method::POST, format!("{}/v9/projects", self.base_url))
            .json(&json!({
                "name": project_name,
                "gitRepository": { "type": "github", "repo": repo_full_name },
            }))
            .send()
            .await
            .map_err(|e| format!("Vercel request failed: {e}"))?;

        if response.status().is_success() {
            let project: serde_json::Value = response
                .json()
                .await
                .map_err(|e| format!("Invalid Vercel response: {e}"))?;
            return Ok(project["name"].as_str().unwrap_or(project_name).to_string());
        }

        let status = response.status();
        let detail: serde_json::Value = response.json().await.unwrap_or_default();
        if detail["error"]["code"] == "conflict" {
            tracing::debug!("Vercel project {project_name} already exists");
            return Ok(project_name.to_string());
        }

        Err(format!("Failed to create Vercel project ({status}): {detail}"))
    }

    /// Trigger a deployment from the repo's default branch.
    pub async fn deploy(
        &self,
        project_name: &str,
        repo_id: u64,
        branch: &str,
    ) -> Result<DeploymentInfo, String> {
        let response = self
            .request(
                reqwest::Method::POST,
                format!("{}/v13/deployments", self.base_url),
            )
            .json(&json!({
                "name": project_name,
                "gitSource": {
                    "type": "github",
                    "repoId": repo_id,
                    "ref": branch,
                },
                "target": "production",
            }))
            .send()
            .await
            .map_err(|e| format!("Vercel request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("Vercel deployment failed ({status}): {detail}"));
        }

        let deployment: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("Invalid Vercel response: {e}"))?;

        let url = deployment["url"].as_str().unwrap_or_default();
        Ok(DeploymentInfo {
            deployment_id: deployment["id"].as_str().unwrap_or_default().to_string(),
            deployment_url: format!("https://{url}"),
            project_url: format!("https://{project_name}.vercel.app"),
        })
    }

    /// Poll a deployment's ready state.
    pub async fn deployment_status(&self, deployment_id: &str) -> Result<String, String> {
        let response = self
            .request(
                reqwest::Method::GET,
                format!("{}/v13/deployments/{deployment_id}", self.base_url),
            )
            .send()
            .await
            .map_err(|e| format!("Vercel request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!(
                "Vercel status check failed with status {}",
                response.status()
            ));
        }

        let deployment: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("Invalid Vercel response: {e}"))?;

        Ok(deployment["readyState"]
            .as_str()
            .unwrap_or("UNKNOWN")
            .to_string())
    }
}

/// Look up a GitHub repository's numeric id, which the deployment API needs.
pub async fn github_repo_id(repo_full_name: &str, github_token: &str) -> Result<u64, String> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("themeforge")
        .build()
        .map_err(|e| format!("Failed to build client: {e}"))?;

    let response = http
        .get(format!("https://api.github.com/repos/{repo_full_name}"))
        .bearer_auth(github_token)
        .header("Accept", "application/vnd.github.v3+json")
        .send()
        .await
        .map_err(|e| format!("GitHub request failed: {e}"))?;

    if !response.status().is_success() {
        return Err(format!(
            "Failed to get GitHub repo info: {}",
            response.status()
        ));
    }

    let repo: serde_json::Value = response
        .json()
        .await
        .map_err(|e| format!("Invalid GitHub response: {e}"))?;

    repo["id"]
        .as_u64()
        .ok_or_else(|| "GitHub repo response missing id".to_string())
}
