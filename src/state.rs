use std::sync::Arc;

use sqlx::PgPool;

use crate::ai::GenerationService;
use crate::config::Config;
use crate::integrations::github::GithubClient;
use crate::integrations::unsplash::UnsplashClient;
use crate::integrations::vercel::VercelClient;
use crate::rate_limit::{GenerationRateLimiter, LoginRateLimiter};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub ai: GenerationService,
    pub github: Option<GithubClient>,
    pub vercel: Option<VercelClient>,
    pub unsplash: Option<UnsplashClient>,
    pub generation_limiter: GenerationRateLimiter,
    pub login_limiter: LoginRateLimiter,
}
