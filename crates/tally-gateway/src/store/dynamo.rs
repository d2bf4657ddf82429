//! DynamoDB-backed `KvStore`.
//!
//! Item layout: `pk` (S) partition key, `count` (N), `lastUpdated` (S, RFC 3339).
//! Conditional puts use `attribute_not_exists(pk)` for creation and
//! `#count = :expected` for compare-and-swap.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};

use tally_core::store::{KvStore, PutCondition, StoreResult};
use tally_core::{CounterRecord, StoreError};

use crate::config::StoreSection;

pub const ATTR_PK: &str = "pk";
pub const ATTR_COUNT: &str = "count";
pub const ATTR_LAST_UPDATED: &str = "lastUpdated";

#[derive(Clone)]
pub struct DynamoKvStore {
    client: Client,
    table: String,
}

impl DynamoKvStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Build a client from the default AWS provider chain plus config overrides.
    pub async fn connect(section: &StoreSection) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &section.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(url) = &section.endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let sdk = loader.load().await;
        tracing::info!(
            table = %section.table_name,
            region = ?sdk.region(),
            "dynamodb client ready"
        );
        Self::new(Client::new(&sdk), section.table_name.clone())
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl KvStore for DynamoKvStore {
    fn backend(&self) -> &'static str {
        "dynamodb"
    }

    async fn get_item(&self, key: &str) -> StoreResult<Option<CounterRecord>> {
        let out = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(ATTR_PK, AttributeValue::S(key.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("get_item: {}", DisplayErrorContext(&e))))?;

        out.item().map(decode_item).transpose()
    }

    async fn put_item(&self, record: CounterRecord, condition: PutCondition) -> StoreResult<()> {
        let mut req = self
            .client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(encode_item(&record)));

        req = match condition {
            PutCondition::None => req,
            PutCondition::NotExists => req.condition_expression("attribute_not_exists(pk)"),
            PutCondition::CountEquals(expected) => req
                .condition_expression("#count = :expected")
                .expression_attribute_names("#count", ATTR_COUNT)
                .expression_attribute_values(":expected", AttributeValue::N(expected.to_string())),
        };

        match req.send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let conflict = e
                    .as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false);
                if conflict {
                    Err(StoreError::ConditionFailed)
                } else {
                    Err(StoreError::Transport(format!(
                        "put_item: {}",
                        DisplayErrorContext(&e)
                    )))
                }
            }
        }
    }
}

pub fn encode_item(record: &CounterRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (ATTR_PK.to_string(), AttributeValue::S(record.key.clone())),
        (ATTR_COUNT.to_string(), AttributeValue::N(record.count.to_string())),
        (
            ATTR_LAST_UPDATED.to_string(),
            AttributeValue::S(record.last_updated.to_rfc3339()),
        ),
    ])
}

/// Decode a stored item. A missing `lastUpdated` (items bumped by a bare
/// `ADD count :1` update) decodes as the Unix epoch.
pub fn decode_item(item: &HashMap<String, AttributeValue>) -> StoreResult<CounterRecord> {
    let key = item
        .get(ATTR_PK)
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| StoreError::Malformed("missing string attribute pk".into()))?;

    let count = item
        .get(ATTR_COUNT)
        .and_then(|v| v.as_n().ok())
        .ok_or_else(|| {
            StoreError::Malformed(format!("item {key}: missing number attribute count"))
        })?
        .parse::<u64>()
        .map_err(|e| StoreError::Malformed(format!("item {key}: bad count: {e}")))?;

    let last_updated = match item.get(ATTR_LAST_UPDATED).and_then(|v| v.as_s().ok()) {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map_err(|e| StoreError::Malformed(format!("item {key}: bad lastUpdated: {e}")))?
            .with_timezone(&Utc),
        None => DateTime::<Utc>::default(),
    };

    Ok(CounterRecord::new(key.clone(), count, last_updated))
}
