use std::time::Duration;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use crate::core::library::{LibraryError, LibraryResult};
use crate::items::{dedupe_item_ids, EligibleItemService};

// HttpItemService asks the library catalog for the items of a work, e.g.
// GET {base_url}/{resource_id}/items -> [{"id": "2286894", "cdl": true}, ...]
#[derive(Debug, Clone)]
pub struct HttpItemService {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogItem {
    id: Value,
    #[serde(default)]
    cdl: bool,
}

impl HttpItemService {
    pub fn new(base_url: &str, timeout: Duration) -> LibraryResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn items_url(&self, resource_id: &str) -> String {
        format!("{}/{}/items", self.base_url, resource_id)
    }
}

pub(crate) fn eligible_ids(items: Vec<CatalogItem>) -> Vec<String> {
    let ids = items.into_iter()
        .filter(|item| item.cdl)
        .map(|item| match item.id {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect();
    dedupe_item_ids(ids)
}

#[async_trait]
impl EligibleItemService for HttpItemService {
    async fn item_ids(&self, resource_id: &str) -> LibraryResult<Vec<String>> {
        let url = self.items_url(resource_id);
        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        // an unknown work has no lendable items
        if status == StatusCode::NOT_FOUND {
            debug!(resource_id, "catalog has no record of work");
            return Ok(vec![]);
        }
        if !status.is_success() {
            return Err(LibraryError::catalog_unavailable(
                format!("catalog returned {} for {}", status, url).as_str(), Some(status.as_u16().to_string())));
        }
        let items: Vec<CatalogItem> = response.json().await?;
        Ok(eligible_ids(items))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use crate::core::library::LibraryError;
    use crate::items::EligibleItemService;
    use crate::items::http_item_service::{CatalogItem, eligible_ids, HttpItemService};

    #[tokio::test]
    async fn test_should_keep_only_cdl_items() {
        let items: Vec<CatalogItem> = serde_json::from_str(
            r#"[{"id": "i1", "cdl": true}, {"id": 42, "cdl": true}, {"id": "i3", "cdl": false}, {"id": "i4"}, {"id": "i1", "cdl": true}]"#)
            .expect("should parse");
        assert_eq!(vec!["i1".to_string(), "42".to_string()], eligible_ids(items));
    }

    #[tokio::test]
    async fn test_should_build_items_url() {
        let svc = HttpItemService::new("http://catalog.test/bibliographic/", Duration::from_secs(1)).expect("should build");
        assert_eq!("http://catalog.test/bibliographic/work1/items", svc.items_url("work1").as_str());
    }

    #[tokio::test]
    async fn test_should_surface_unreachable_catalog() {
        let svc = HttpItemService::new("http://127.0.0.1:9", Duration::from_secs(2)).expect("should build");
        let res = svc.item_ids("work1").await;
        assert!(matches!(res, Err(LibraryError::CatalogUnavailable { .. })));
    }
}
