use super::item::{s, Item};
use crate::domain::{Connection, ConnectionRepository, DomainError, DomainResult};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use tracing::{debug, instrument};

pub(crate) fn connection_to_item(connection: &Connection) -> Item {
    Item::from([
        ("userId".to_string(), s(&connection.user_id)),
        ("tenantId".to_string(), s(&connection.tenant_id)),
    ])
}

/// Connection table keyed by `userId`
#[derive(Clone)]
pub struct DynamoConnectionRepository {
    client: Client,
    table: String,
}

impl DynamoConnectionRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl ConnectionRepository for DynamoConnectionRepository {
    #[instrument(skip(self, connection), fields(user_id = %connection.user_id, tenant_id = %connection.tenant_id))]
    async fn insert_connection(&self, connection: Connection) -> DomainResult<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(connection_to_item(&connection)))
            .send()
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        debug!("connection stored");
        Ok(())
    }
}
