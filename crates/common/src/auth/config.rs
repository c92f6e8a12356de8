use std::time::Duration;

/// Where and how bearer tokens are verified
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub region: String,
    pub user_pool_id: String,
    /// Overrides the pool's well-known JWKS location
    pub jwks_url: Option<String>,
    /// Overrides the pool's issuer
    pub issuer: Option<String>,
    pub jwks_cache_ttl: Duration,
    /// Header whose value is looked up in the tenant connection map
    pub routing_header: String,
}

impl AuthConfig {
    pub fn new(region: impl Into<String>, user_pool_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            user_pool_id: user_pool_id.into(),
            jwks_url: None,
            issuer: None,
            jwks_cache_ttl: Duration::from_secs(3600),
            routing_header: "BasePath".to_string(),
        }
    }

    pub fn issuer(&self) -> String {
        self.issuer.clone().unwrap_or_else(|| {
            format!(
                "https://cognito-idp.{}.amazonaws.com/{}",
                self.region, self.user_pool_id
            )
        })
    }

    pub fn jwks_url(&self) -> String {
        self.jwks_url
            .clone()
            .unwrap_or_else(|| format!("{}/.well-known/jwks.json", self.issuer()))
    }
}
