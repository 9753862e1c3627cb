pub mod ddb_charge_list_repository;
pub mod memory_charge_list_repository;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use crate::charges::domain::model::ResourceChargeList;
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::core::repository::Repository;

#[async_trait]
pub trait ChargeListRepository: Repository<ResourceChargeList> {
    // charge lists with a pending hold or a charge expired at `now`
    async fn query_sweepable(&self, now: NaiveDateTime,
                             page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<ResourceChargeList>>;
}
