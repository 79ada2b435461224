use std::net::IpAddr;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    /// Hostname of the main application; every other Host header is
    /// treated as a tenant site.
    pub app_domain: String,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
    pub upload_dir: String,
    pub max_upload_size: usize,
    pub export_dir: String,
    pub payment_webhook_key: String,
    pub ai_api_keys: Vec<String>,
    pub ai_model: String,
    pub unsplash_access_key: Option<String>,
    pub github: Option<GithubConfig>,
    pub vercel: Option<VercelConfig>,
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub token: String,
    pub owner: String,
}

#[derive(Debug, Clone)]
pub struct VercelConfig {
    pub token: String,
    pub team_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;
        let payment_webhook_key = env_required("PAYMENT_WEBHOOK_KEY")?;

        let host: IpAddr = env_or("THEMEFORGE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid THEMEFORGE_HOST: {e}"))?;

        let port: u16 = env_or("THEMEFORGE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid THEMEFORGE_PORT: {e}"))?;

        let base_url = env_or("THEMEFORGE_BASE_URL", &format!("http://{host}:{port}"));

        let app_domain = env_or("THEMEFORGE_APP_DOMAIN", "localhost");

        let max_body_size: usize = env_or("THEMEFORGE_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid THEMEFORGE_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("THEMEFORGE_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid THEMEFORGE_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env_or("THEMEFORGE_LOG_LEVEL", "info");

        let upload_dir = env_or("THEMEFORGE_UPLOAD_DIR", "public/uploads");

        let max_upload_size: usize = env_or("THEMEFORGE_MAX_UPLOAD_SIZE", "20971520")
            .parse()
            .map_err(|e| format!("Invalid THEMEFORGE_MAX_UPLOAD_SIZE: {e}"))?;

        let export_dir = env_or("THEMEFORGE_EXPORT_DIR", "public/exports");

        // AI credentials: AI_API_KEYS is a comma-separated list; the numbered
        // AI_API_KEY / AI_API_KEY_2 / ... form is also accepted.
        let mut ai_api_keys: Vec<String> = env_or("AI_API_KEYS", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if ai_api_keys.is_empty() {
            for i in 1..=50 {
                let name = if i == 1 {
                    "AI_API_KEY".to_string()
                } else {
                    format!("AI_API_KEY_{i}")
                };
                match std::env::var(&name) {
                    Ok(key) if !key.trim().is_empty() => ai_api_keys.push(key.trim().to_string()),
                    _ => {}
                }
            }
        }

        let ai_model = env_or("AI_MODEL", "gemini-2.5-flash");

        let unsplash_access_key = std::env::var("UNSPLASH_ACCESS_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        let github = match (
            std::env::var("GITHUB_TOKEN").ok(),
            std::env::var("GITHUB_OWNER").ok(),
        ) {
            (Some(token), Some(owner)) if !token.is_empty() && !owner.is_empty() => {
                Some(GithubConfig { token, owner })
            }
            _ => None,
        };

        let vercel = match std::env::var("VERCEL_TOKEN").ok().filter(|s| !s.is_empty()) {
            Some(token) => Some(VercelConfig {
                token,
                team_id: std::env::var("VERCEL_TEAM_ID").ok().filter(|s| !s.is_empty()),
            }),
            None => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            app_domain,
            max_body_size,
            trusted_proxies,
            log_level,
            upload_dir,
            max_upload_size,
            export_dir,
            payment_webhook_key,
            ai_api_keys,
            ai_model,
            unsplash_access_key,
            github,
            vercel,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
