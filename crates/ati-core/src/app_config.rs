use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Per-post feature files for the primary period, in preference order.
    pub posts_sources: Vec<PathBuf>,
    /// Optional feature files for the earlier period, in preference order.
    pub train_posts_sources: Vec<PathBuf>,
    pub brand_names_path: Option<PathBuf>,
    pub oracle_url: Option<String>,
    pub oracle_timeout_secs: u64,
    pub similarity_sigma: f64,
    pub high_risk_z: f64,
    pub cluster_k: usize,
    pub cluster_seed: Option<u64>,
    pub top_posts: usize,
    pub trend_segments: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("posts_sources", &self.posts_sources)
            .field("train_posts_sources", &self.train_posts_sources)
            .field("brand_names_path", &self.brand_names_path)
            // Oracle URLs may carry credentials in the userinfo part.
            .field("oracle_url", &self.oracle_url.as_ref().map(|_| "[redacted]"))
            .field("oracle_timeout_secs", &self.oracle_timeout_secs)
            .field("similarity_sigma", &self.similarity_sigma)
            .field("high_risk_z", &self.high_risk_z)
            .field("cluster_k", &self.cluster_k)
            .field("cluster_seed", &self.cluster_seed)
            .field("top_posts", &self.top_posts)
            .field("trend_segments", &self.trend_segments)
            .finish()
    }
}
