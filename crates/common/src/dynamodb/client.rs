use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

/// DynamoDB tables and endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamoDbConfig {
    /// Local endpoint such as DynamoDB Local; AWS is used when unset
    pub endpoint_url: Option<String>,
    pub auth_table: String,
    pub config_table: String,
    pub tenant_table: String,
    pub connection_table: String,
}

impl Default for DynamoDbConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            auth_table: "auth-info".to_string(),
            config_table: "silo-config".to_string(),
            tenant_table: "tenants".to_string(),
            connection_table: "connections".to_string(),
        }
    }
}

pub fn dynamodb_client(sdk_config: &SdkConfig, config: &DynamoDbConfig) -> Client {
    match &config.endpoint_url {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "using custom DynamoDB endpoint");
            let dynamo_config = aws_sdk_dynamodb::config::Builder::from(sdk_config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamo_config)
        }
        None => Client::new(sdk_config),
    }
}
