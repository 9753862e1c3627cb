use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{NaiveDateTime, Utc};

use crate::charges::domain::model::ResourceChargeList;
use crate::charges::repository::ChargeListRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::ddb::{from_ddb, parse_date_attribute, parse_number_attribute, parse_string_attribute, string_date, to_ddb_page};

// sorts after every real expiration so ledgers without charges never match the sweep filter
const NO_EXPIRATION: &str = "9999-12-31T23:59:59";

#[derive(Debug)]
pub struct DDBChargeListRepository {
    client: Client,
    table_name: String,
}

impl DDBChargeListRepository {
    pub fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

fn patrons_attribute(entity: &ResourceChargeList) -> AttributeValue {
    AttributeValue::S(format!("|{}|", entity.patrons().join("|")))
}

fn next_expiration_attribute(entity: &ResourceChargeList) -> AttributeValue {
    entity.next_expiration().map(string_date).unwrap_or_else(|| AttributeValue::S(NO_EXPIRATION.to_string()))
}

fn to_item(entity: &ResourceChargeList) -> LibraryResult<HashMap<String, AttributeValue>> {
    Ok(HashMap::from([
        ("resource_id".to_string(), AttributeValue::S(entity.resource_id.to_string())),
        ("version".to_string(), AttributeValue::N(entity.version.to_string())),
        ("charged_items".to_string(), AttributeValue::S(serde_json::to_string(&entity.charged_items)?)),
        ("hold_queue".to_string(), AttributeValue::S(serde_json::to_string(&entity.hold_queue)?)),
        ("hold_count".to_string(), AttributeValue::N(entity.pending_hold_count().to_string())),
        ("charge_count".to_string(), AttributeValue::N(entity.charged_items.len().to_string())),
        ("next_expiration".to_string(), next_expiration_attribute(entity)),
        ("patrons".to_string(), patrons_attribute(entity)),
        ("created_at".to_string(), string_date(entity.created_at)),
        ("updated_at".to_string(), string_date(entity.updated_at)),
    ]))
}

#[async_trait]
impl Repository<ResourceChargeList> for DDBChargeListRepository {
    async fn create(&self, entity: &ResourceChargeList) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(resource_id)")
            .set_item(Some(to_item(entity)?))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn update(&self, entity: &ResourceChargeList) -> LibraryResult<usize> {
        let now = Utc::now().naive_utc();
        let table_name: &str = self.table_name.as_ref();

        self.client
            .update_item()
            .table_name(table_name)
            .key("resource_id", AttributeValue::S(entity.resource_id.clone()))
            .update_expression("SET version = :version, charged_items = :charged_items, hold_queue = :hold_queue, hold_count = :hold_count, charge_count = :charge_count, next_expiration = :next_expiration, patrons = :patrons, updated_at = :updated_at")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .expression_attribute_values(":version", AttributeValue::N((entity.version + 1).to_string()))
            .expression_attribute_values(":charged_items", AttributeValue::S(serde_json::to_string(&entity.charged_items)?))
            .expression_attribute_values(":hold_queue", AttributeValue::S(serde_json::to_string(&entity.hold_queue)?))
            .expression_attribute_values(":hold_count", AttributeValue::N(entity.pending_hold_count().to_string()))
            .expression_attribute_values(":charge_count", AttributeValue::N(entity.charged_items.len().to_string()))
            .expression_attribute_values(":next_expiration", next_expiration_attribute(entity))
            .expression_attribute_values(":patrons", patrons_attribute(entity))
            .expression_attribute_values(":updated_at", string_date(now))
            .condition_expression("attribute_exists(version) AND version = :old_version")
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn get(&self, id: &str) -> LibraryResult<ResourceChargeList> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .get_item()
            .table_name(table_name)
            .key("resource_id", AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .send()
            .await.map_err(LibraryError::from)?;
        match res.item() {
            Some(map) => ResourceChargeList::try_from(map),
            None => Err(LibraryError::not_found(format!("charge list not found for {}", id).as_str())),
        }
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<ResourceChargeList>> {
        let table_name: &str = self.table_name.as_ref();
        let mut request = self.client
            .scan()
            .table_name(table_name)
            .limit(cmp::min(page_size, 500) as i32)
            .set_exclusive_start_key(to_ddb_page(page));
        if let Some(netid) = predicate.get("netid") {
            request = request
                .filter_expression("contains(patrons, :netid)")
                .expression_attribute_values(":netid", AttributeValue::S(format!("|{}|", netid)));
        }
        let res = request.send().await.map_err(LibraryError::from)?;
        let records = res.items().unwrap_or_default().iter()
            .map(ResourceChargeList::try_from)
            .collect::<LibraryResult<Vec<ResourceChargeList>>>()?;
        Ok(from_ddb(page, page_size, res.last_evaluated_key(), records))
    }
}

#[async_trait]
impl ChargeListRepository for DDBChargeListRepository {
    async fn query_sweepable(&self, now: NaiveDateTime,
                             page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<ResourceChargeList>> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .scan()
            .table_name(table_name)
            .limit(cmp::min(page_size, 500) as i32)
            .set_exclusive_start_key(to_ddb_page(page))
            .filter_expression("hold_count > :zero OR (charge_count > :zero AND next_expiration <= :now)")
            .expression_attribute_values(":zero", AttributeValue::N("0".to_string()))
            .expression_attribute_values(":now", string_date(now))
            .send()
            .await.map_err(LibraryError::from)?;
        let records = res.items().unwrap_or_default().iter()
            .map(ResourceChargeList::try_from)
            .collect::<LibraryResult<Vec<ResourceChargeList>>>()?;
        Ok(from_ddb(page, page_size, res.last_evaluated_key(), records))
    }
}

impl TryFrom<&HashMap<String, AttributeValue>> for ResourceChargeList {
    type Error = LibraryError;

    fn try_from(map: &HashMap<String, AttributeValue>) -> Result<Self, Self::Error> {
        let charged_items = parse_string_attribute("charged_items", map).unwrap_or_else(|| "[]".to_string());
        let hold_queue = parse_string_attribute("hold_queue", map).unwrap_or_else(|| "[]".to_string());
        Ok(ResourceChargeList {
            resource_id: parse_string_attribute("resource_id", map).ok_or_else(||
                LibraryError::serialization("charge list without resource_id"))?,
            version: parse_number_attribute("version", map),
            charged_items: serde_json::from_str(charged_items.as_str())?,
            hold_queue: serde_json::from_str(hold_queue.as_str())?,
            created_at: parse_date_attribute("created_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            updated_at: parse_date_attribute("updated_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
        })
    }
}
