use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};
use crate::charges::domain::ledger::LedgerSummary;
use crate::charges::factory::ChargeManagerFactory;
use crate::core::library::LibraryResult;
use crate::sweep::domain::{SweepReport, SweepService};

// BulkHoldProcessor expires stale loans and holds and promotes waiting patrons across all works
pub struct BulkHoldProcessor {
    factory: ChargeManagerFactory,
    page_size: usize,
}

impl BulkHoldProcessor {
    pub fn new(factory: ChargeManagerFactory) -> Self {
        let page_size = factory.config().sweep_page_size.max(1);
        Self {
            factory,
            page_size,
        }
    }

    async fn process_charge_list(&self, resource_id: &str) -> LibraryResult<LedgerSummary> {
        let manager = self.factory.create_charge_manager(resource_id);
        let expired = manager.expire_charges().await?;
        let activated = manager.activate_holds().await?;
        Ok(LedgerSummary {
            expired_charges: expired.expired_charges + activated.expired_charges,
            expired_holds: expired.expired_holds + activated.expired_holds,
            activated_holds: activated.activated_holds,
        })
    }
}

#[async_trait]
impl SweepService for BulkHoldProcessor {
    async fn process(&self) -> LibraryResult<SweepReport> {
        let repository = self.factory.charge_list_repository();
        let now = Utc::now().naive_utc();
        let mut report = SweepReport::default();
        let mut next_page: Option<String> = None;
        loop {
            let res = repository.query_sweepable(now, next_page.as_deref(), self.page_size).await?;
            for charge_list in res.records {
                report.scanned += 1;
                match self.process_charge_list(charge_list.resource_id.as_str()).await {
                    Ok(summary) => report.record(&summary),
                    Err(err) => {
                        report.failed += 1;
                        error!(resource_id = charge_list.resource_id.as_str(), "failed to sweep charge list {}", err);
                    }
                }
            }
            next_page = res.next_page;
            if next_page.is_none() {
                break;
            }
        }
        info!(scanned = report.scanned, expired_charges = report.expired_charges, expired_holds = report.expired_holds,
            activated_holds = report.activated_holds, failed = report.failed, "sweep finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDateTime, Utc};
    use crate::charges::domain::model::{ChargedItem, Hold, HoldState, ResourceChargeList};
    use crate::charges::factory::ChargeManagerFactory;
    use crate::charges::repository::memory_charge_list_repository::MemoryChargeListRepository;
    use crate::core::domain::Configuration;
    use crate::core::library::{LibraryError, LibraryResult};
    use crate::core::repository::Repository;
    use crate::gateway::factory::create_notifier;
    use crate::gateway::memory::publisher::MemoryPublisher;
    use crate::gateway::notifier::NOTIFICATION_EVENT;
    use crate::items::EligibleItemService;
    use crate::sweep::domain::{SweepReport, SweepService};
    use crate::sweep::domain::service::BulkHoldProcessor;

    // one item per work, except works named "broken" whose lookup fails
    struct OneItemService {}

    #[async_trait]
    impl EligibleItemService for OneItemService {
        async fn item_ids(&self, resource_id: &str) -> LibraryResult<Vec<String>> {
            if resource_id.starts_with("broken") {
                return Err(LibraryError::catalog_unavailable("catalog is down", None));
            }
            Ok(vec!["i1".to_string()])
        }
    }

    fn processor(page_size: usize) -> (BulkHoldProcessor, Arc<MemoryChargeListRepository>, Arc<MemoryPublisher>) {
        let mut config = Configuration::new("test");
        config.sweep_page_size = page_size;
        let repo = Arc::new(MemoryChargeListRepository::new());
        let publisher = Arc::new(MemoryPublisher::new());
        let factory = ChargeManagerFactory::new(&config, Arc::new(OneItemService {}), repo.clone(),
                                                publisher.clone(), create_notifier(publisher.clone()));
        (BulkHoldProcessor::new(factory), repo, publisher)
    }

    fn active_hold(netid: &str, expiration_time: NaiveDateTime) -> Hold {
        let mut hold = Hold::new(netid, expiration_time - Duration::hours(1));
        hold.state = HoldState::Active { expiration_time };
        hold
    }

    #[tokio::test]
    async fn test_should_activate_hold_after_charge_expires() {
        let (processor, repo, publisher) = processor(10);
        let now = Utc::now().naive_utc();
        let mut charge_list = ResourceChargeList::new("work1");
        charge_list.charged_items.push(ChargedItem::new("i1", "bob", now - Duration::minutes(1)));
        charge_list.hold_queue.push(Hold::new("alice", now - Duration::hours(2)));
        repo.create(&charge_list).await.expect("should create");

        let report = processor.process().await.expect("should sweep");
        assert_eq!(SweepReport { scanned: 1, expired_charges: 1, expired_holds: 0, activated_holds: 1, failed: 0 }, report);
        let stored = repo.get("work1").await.expect("should get");
        assert!(stored.charged_items.is_empty());
        assert!(stored.hold_queue[0].is_active(Utc::now().naive_utc()));
        let notifications = publisher.events_named(NOTIFICATION_EVENT).await;
        assert_eq!(1, notifications.len());
        assert_eq!(Some("alice"), notifications[0].metadata_value("netid"));
        assert_eq!(1, publisher.events_named("hold_activated").await.len());
    }

    #[tokio::test]
    async fn test_should_expire_lapsed_hold_and_promote_next() {
        let (processor, repo, publisher) = processor(10);
        let now = Utc::now().naive_utc();
        let mut charge_list = ResourceChargeList::new("work1");
        charge_list.hold_queue.push(active_hold("alice", now - Duration::minutes(1)));
        charge_list.hold_queue.push(Hold::new("carol", now - Duration::hours(1)));
        repo.create(&charge_list).await.expect("should create");

        let report = processor.process().await.expect("should sweep");
        assert_eq!(1, report.expired_holds);
        assert_eq!(1, report.activated_holds);
        let stored = repo.get("work1").await.expect("should get");
        assert_eq!(HoldState::Expired, stored.hold_queue[0].state);
        assert!(stored.hold_queue[1].is_active(Utc::now().naive_utc()));
        let templates: Vec<String> = publisher.events_named(NOTIFICATION_EVENT).await.iter()
            .filter_map(|e| e.metadata_value("template").map(str::to_string))
            .collect();
        assert_eq!(vec!["hold_expired".to_string(), "hold_activated".to_string()], templates);
    }

    #[tokio::test]
    async fn test_should_leave_unchanged_ledger_untouched() {
        let (processor, repo, publisher) = processor(10);
        let now = Utc::now().naive_utc();
        let mut charge_list = ResourceChargeList::new("work1");
        charge_list.charged_items.push(ChargedItem::new("i1", "bob", now + Duration::hours(1)));
        charge_list.hold_queue.push(Hold::new("alice", now));
        repo.create(&charge_list).await.expect("should create");

        let report = processor.process().await.expect("should sweep");
        assert_eq!(SweepReport { scanned: 1, ..Default::default() }, report);
        let stored = repo.get("work1").await.expect("should get");
        assert_eq!(charge_list.version, stored.version);
        assert_eq!(charge_list.updated_at, stored.updated_at);
        assert!(publisher.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_should_continue_past_failing_ledger() {
        let (processor, repo, _) = processor(2);
        let now = Utc::now().naive_utc();
        for id in ["a_work", "broken_work", "c_work", "d_work"] {
            let mut charge_list = ResourceChargeList::new(id);
            charge_list.hold_queue.push(Hold::new("alice", now));
            repo.create(&charge_list).await.expect("should create");
        }

        let report = processor.process().await.expect("should sweep");
        assert_eq!(4, report.scanned);
        assert_eq!(1, report.failed);
        assert_eq!(3, report.activated_holds);
        for id in ["a_work", "c_work", "d_work"] {
            assert!(repo.get(id).await.expect("should get").hold_queue[0].is_active(Utc::now().naive_utc()));
        }
        assert!(repo.get("broken_work").await.expect("should get").hold_queue[0].is_inactive());
    }
}
