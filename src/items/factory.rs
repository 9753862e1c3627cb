use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use crate::core::domain::Configuration;
use crate::core::library::LibraryResult;
use crate::items::EligibleItemService;
use crate::items::http_item_service::HttpItemService;
use crate::items::static_item_service::StaticItemService;

pub fn create_item_service(config: &Configuration) -> LibraryResult<Arc<dyn EligibleItemService>> {
    match config.catalog_url.as_deref() {
        Some(url) => {
            let svc = HttpItemService::new(url, Duration::from_secs(config.catalog_timeout_secs))?;
            Ok(Arc::new(svc))
        }
        None => {
            warn!("no catalog url configured, every work is ineligible");
            Ok(Arc::new(StaticItemService::new()))
        }
    }
}
