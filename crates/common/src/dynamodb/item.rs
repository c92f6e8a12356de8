use anyhow::{anyhow, Result};
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

pub(crate) type Item = HashMap<String, AttributeValue>;

pub(crate) fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

pub(crate) fn get_string(item: &Item, name: &str) -> Result<String> {
    item.get(name)
        .ok_or_else(|| anyhow!("attribute {} missing", name))?
        .as_s()
        .map(|v| v.to_string())
        .map_err(|_| anyhow!("attribute {} is not a string", name))
}

pub(crate) fn get_string_or_default(item: &Item, name: &str) -> String {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .unwrap_or_default()
}

pub(crate) fn get_bool_or(item: &Item, name: &str, default: bool) -> bool {
    item.get(name)
        .and_then(|v| v.as_bool().ok())
        .copied()
        .unwrap_or(default)
}
