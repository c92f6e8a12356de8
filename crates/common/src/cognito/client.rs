use crate::domain::{
    AuthFlow, DomainError, DomainResult, IdentityProvider, IdentityUser, NewIdentityUser,
    UserPoolClientSpec, UserPoolSpec,
};
use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cognitoidentityprovider::types::{
    AdminCreateUserConfigType, AttributeDataType, AttributeType, ExplicitAuthFlowsType,
    MessageTemplateType, PreventUserExistenceErrorTypes, SchemaAttributeType, TimeUnitsType,
    TokenValidityUnitsType, UsernameAttributeType, VerifiedAttributeType,
};
use aws_sdk_cognitoidentityprovider::Client;
use tracing::{debug, info, instrument};

const SUB_ATTRIBUTE: &str = "sub";

/// Build the identity provider SDK client, optionally against a local endpoint.
pub fn cognito_client(sdk_config: &SdkConfig, endpoint_url: Option<&str>) -> Client {
    match endpoint_url {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "using custom identity provider endpoint");
            let config = aws_sdk_cognitoidentityprovider::config::Builder::from(sdk_config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(config)
        }
        None => Client::new(sdk_config),
    }
}

pub(crate) fn explicit_auth_flow(flow: AuthFlow) -> ExplicitAuthFlowsType {
    match flow {
        AuthFlow::AdminUserPassword => ExplicitAuthFlowsType::AllowAdminUserPasswordAuth,
        AuthFlow::UserSrp => ExplicitAuthFlowsType::AllowUserSrpAuth,
        AuthFlow::RefreshToken => ExplicitAuthFlowsType::AllowRefreshTokenAuth,
    }
}

pub(crate) fn find_attribute<'a>(attributes: &'a [AttributeType], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|attr| attr.name() == name)
        .and_then(|attr| attr.value())
}

fn provider_error<E>(operation: &str, err: E) -> DomainError
where
    E: std::fmt::Display,
{
    DomainError::IdentityProvider(format!("{operation} failed: {err}"))
}

/// [`IdentityProvider`] backed by Amazon Cognito user pools.
#[derive(Clone)]
pub struct CognitoIdentityProvider {
    client: Client,
}

impl CognitoIdentityProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    #[instrument(skip(self, spec), fields(pool_name = %spec.pool_name))]
    async fn create_user_pool(&self, spec: UserPoolSpec) -> DomainResult<String> {
        let invite = MessageTemplateType::builder()
            .email_subject(&spec.invite_subject)
            .email_message(&spec.invite_message)
            .build();

        let admin_config = AdminCreateUserConfigType::builder()
            .allow_admin_create_user_only(true)
            .invite_message_template(invite)
            .build();

        let mut request = self
            .client
            .create_user_pool()
            .pool_name(&spec.pool_name)
            .admin_create_user_config(admin_config)
            .username_attributes(UsernameAttributeType::Email)
            .auto_verified_attributes(VerifiedAttributeType::Email);

        for name in &spec.custom_attributes {
            request = request.schema(
                SchemaAttributeType::builder()
                    .name(name)
                    .attribute_data_type(AttributeDataType::String)
                    .mutable(true)
                    .build(),
            );
        }

        let output = request
            .send()
            .await
            .map_err(|e| provider_error("create user pool", e.into_service_error()))?;

        let pool_id = output
            .user_pool()
            .and_then(|pool| pool.id())
            .ok_or_else(|| DomainError::Repository(anyhow!("user pool created without an id")))?
            .to_string();

        debug!(user_pool_id = %pool_id, "user pool created");
        Ok(pool_id)
    }

    #[instrument(skip(self, spec), fields(user_pool_id = %spec.user_pool_id, client_name = %spec.client_name))]
    async fn create_user_pool_client(&self, spec: UserPoolClientSpec) -> DomainResult<String> {
        let mut request = self
            .client
            .create_user_pool_client()
            .user_pool_id(&spec.user_pool_id)
            .client_name(&spec.client_name)
            .generate_secret(spec.generate_secret)
            .refresh_token_validity(spec.refresh_token_validity_days)
            .token_validity_units(
                TokenValidityUnitsType::builder()
                    .refresh_token(TimeUnitsType::Days)
                    .build(),
            );

        if spec.prevent_user_existence_errors {
            request = request.prevent_user_existence_errors(PreventUserExistenceErrorTypes::Enabled);
        }
        for flow in &spec.auth_flows {
            request = request.explicit_auth_flows(explicit_auth_flow(*flow));
        }
        for provider in &spec.identity_providers {
            request = request.supported_identity_providers(provider);
        }

        let output = request
            .send()
            .await
            .map_err(|e| provider_error("create user pool client", e.into_service_error()))?;

        let client_id = output
            .user_pool_client()
            .and_then(|client| client.client_id())
            .ok_or_else(|| DomainError::Repository(anyhow!("user pool client created without an id")))?
            .to_string();

        debug!(client_id = %client_id, "user pool client created");
        Ok(client_id)
    }

    #[instrument(skip(self))]
    async fn delete_user_pool(&self, user_pool_id: &str) -> DomainResult<()> {
        self.client
            .delete_user_pool()
            .user_pool_id(user_pool_id)
            .send()
            .await
            .map_err(|e| provider_error("delete user pool", e.into_service_error()))?;

        debug!("user pool deleted");
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_pool_id = %user.user_pool_id))]
    async fn admin_create_user(&self, user: NewIdentityUser) -> DomainResult<IdentityUser> {
        let mut request = self
            .client
            .admin_create_user()
            .user_pool_id(&user.user_pool_id)
            .username(&user.email);

        for (name, value) in &user.attributes {
            let attribute = AttributeType::builder()
                .name(name)
                .value(value)
                .build()
                .map_err(|e| DomainError::Repository(e.into()))?;
            request = request.user_attributes(attribute);
        }

        let output = match request.send().await {
            Ok(output) => output,
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_username_exists_exception() {
                    return Err(DomainError::AlreadyExists(format!("user {}", user.email)));
                }
                return Err(provider_error("create user", service_error));
            }
        };

        let created = output
            .user()
            .ok_or_else(|| DomainError::Repository(anyhow!("user created without details")))?;

        let user_id = find_attribute(created.attributes(), SUB_ATTRIBUTE)
            .ok_or_else(|| DomainError::Repository(anyhow!("created user has no sub")))?
            .to_string();

        Ok(IdentityUser {
            user_id,
            username: created.username().unwrap_or(&user.email).to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn find_user(
        &self,
        user_pool_id: &str,
        username: &str,
    ) -> DomainResult<Option<IdentityUser>> {
        let output = match self
            .client
            .admin_get_user()
            .user_pool_id(user_pool_id)
            .username(username)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_user_not_found_exception() {
                    return Ok(None);
                }
                return Err(provider_error("get user", service_error));
            }
        };

        let user_id = find_attribute(output.user_attributes(), SUB_ATTRIBUTE)
            .ok_or_else(|| DomainError::Repository(anyhow!("user {} has no sub", username)))?
            .to_string();

        Ok(Some(IdentityUser {
            user_id,
            username: output.username().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(name: &str, value: &str) -> AttributeType {
        AttributeType::builder().name(name).value(value).build().unwrap()
    }

    #[test]
    fn test_auth_flow_mapping() {
        assert_eq!(
            explicit_auth_flow(AuthFlow::AdminUserPassword),
            ExplicitAuthFlowsType::AllowAdminUserPasswordAuth
        );
        assert_eq!(
            explicit_auth_flow(AuthFlow::UserSrp),
            ExplicitAuthFlowsType::AllowUserSrpAuth
        );
        assert_eq!(
            explicit_auth_flow(AuthFlow::RefreshToken),
            ExplicitAuthFlowsType::AllowRefreshTokenAuth
        );
    }

    #[test]
    fn test_find_attribute() {
        let attributes = vec![
            attribute("email", "owner@acme.io"),
            attribute("sub", "0c1d-user"),
        ];

        assert_eq!(find_attribute(&attributes, "sub"), Some("0c1d-user"));
        assert_eq!(find_attribute(&attributes, "custom:tenant-id"), None);
    }
}
