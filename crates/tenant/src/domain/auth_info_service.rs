use common::domain::{AuthInfoAndRegion, AuthInfoRepository, DomainError, DomainResult, DEFAULT_TENANT_PATH};
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

const INDEX_PAGE: &str = "index.html";

/// Tenant path of the page that asks for auth info.
///
/// The first path segment of the referring URL names the tenant. Referers
/// without one (the site root, `index.html`, or nothing parseable) map to the
/// shared pool's path.
pub fn path_from_referer(referer: &str) -> String {
    Url::parse(referer)
        .ok()
        .and_then(|url| {
            url.path_segments()?
                .find(|segment| !segment.is_empty())
                .filter(|segment| *segment != INDEX_PAGE)
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_TENANT_PATH.to_string())
}

/// Looks up the identity pool a login page should talk to.
pub struct AuthInfoService {
    auth_info_repository: Arc<dyn AuthInfoRepository>,
    region: String,
}

impl AuthInfoService {
    pub fn new(auth_info_repository: Arc<dyn AuthInfoRepository>, region: impl Into<String>) -> Self {
        Self {
            auth_info_repository,
            region: region.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_info(&self, referer: &str) -> DomainResult<AuthInfoAndRegion> {
        let path = path_from_referer(referer);
        debug!(tenant_path = %path, "looking up auth info");

        let info = self
            .auth_info_repository
            .select(&path)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("auth info for path {}", path)))?;

        Ok(AuthInfoAndRegion {
            project_region: self.region.clone(),
            cognito_region: self.region.clone(),
            user_pool_id: info.user_pool_id,
            user_pool_client_id: info.user_pool_client_id,
        })
    }
}
