use common::domain::{DomainError, DomainResult, RequestValues};

/// Request values a replicated write runs under.
///
/// The envelope metadata names the tenant. Creation events also carry the
/// tenant in their payload, which fills in missing metadata and must agree
/// with it otherwise.
pub fn event_scope(values: &RequestValues, event_tenant_id: &str) -> DomainResult<RequestValues> {
    if values.tenant_id.is_empty() {
        return Ok(values.clone().with_tenant(event_tenant_id));
    }
    if !event_tenant_id.is_empty() && event_tenant_id != values.tenant_id {
        return Err(DomainError::validation(
            "tenantId",
            format!("event tenant {} does not match metadata", event_tenant_id),
        ));
    }
    Ok(values.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_scope() {
        let scoped = event_scope(&RequestValues::default(), "t-1").unwrap();
        assert_eq!(scoped.tenant_id, "t-1");

        let values = RequestValues::default().with_tenant("t-1");
        assert_eq!(event_scope(&values, "t-1").unwrap().tenant_id, "t-1");
        assert_eq!(event_scope(&values, "").unwrap().tenant_id, "t-1");
        assert!(matches!(
            event_scope(&values, "t-2"),
            Err(DomainError::Validation(_))
        ));
    }
}
