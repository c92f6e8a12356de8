use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Custom user attributes carried by every identity pool.
pub mod attributes {
    pub const TENANT_ID: &str = "custom:tenant-id";
    pub const ACCOUNT_OWNER: &str = "custom:account-owner";
    pub const COMPANY_NAME: &str = "custom:company-name";
    pub const FULL_NAME: &str = "custom:full-name";
    pub const EMAIL: &str = "email";
    pub const EMAIL_VERIFIED: &str = "email_verified";
}

/// Everything needed to create a tenant identity pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPoolSpec {
    pub pool_name: String,
    pub invite_subject: String,
    /// Must contain the `{username}` and `{####}` placeholders.
    pub invite_message: String,
    /// Custom string attributes, without the `custom:` prefix.
    pub custom_attributes: Vec<String>,
}

/// App client flows allowed on the pool client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    AdminUserPassword,
    UserSrp,
    RefreshToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPoolClientSpec {
    pub user_pool_id: String,
    pub client_name: String,
    pub auth_flows: Vec<AuthFlow>,
    pub generate_secret: bool,
    pub prevent_user_existence_errors: bool,
    pub refresh_token_validity_days: i32,
    pub identity_providers: Vec<String>,
}

/// Account owner created by the tenant service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentityUser {
    pub user_pool_id: String,
    pub email: String,
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    /// The user's `sub`.
    pub user_id: String,
    pub username: String,
}

/// External identity provider operations used by the provisioning saga
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a user pool and return its id
    async fn create_user_pool(&self, spec: UserPoolSpec) -> DomainResult<String>;

    /// Create an app client on a pool and return the client id
    async fn create_user_pool_client(&self, spec: UserPoolClientSpec) -> DomainResult<String>;

    /// Delete a pool. Used to clean up after losing a provisioning race.
    async fn delete_user_pool(&self, user_pool_id: &str) -> DomainResult<()>;

    /// Create a user with a temporary password.
    /// Returns `DomainError::AlreadyExists` when the username is taken.
    async fn admin_create_user(&self, user: NewIdentityUser) -> DomainResult<IdentityUser>;

    /// Look up a user by username
    async fn find_user(&self, user_pool_id: &str, username: &str) -> DomainResult<Option<IdentityUser>>;
}
