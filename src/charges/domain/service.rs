use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};
use crate::charges::domain::ChargeService;
use crate::charges::domain::ledger::{HoldOutcome, LedgerEffect, LedgerSummary, Transition};
use crate::charges::domain::model::{ChargedItem, ResourceChargeList};
use crate::charges::repository::ChargeListRepository;
use crate::core::domain::{Configuration, LoanPolicy};
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::events::EventPublisher;
use crate::gateway::notifier::Notifier;
use crate::items::EligibleItemService;

const BACKOFF_STEP_MILLIS: u64 = 5;

// ChargeManager runs every operation as load, pure transform, version-checked save, then emits
// the effects of the committed write. A lost race reloads and redoes the whole transform.
pub struct ChargeManager {
    resource_id: String,
    policy: LoanPolicy,
    max_conflict_retries: usize,
    item_service: Arc<dyn EligibleItemService>,
    charge_list_repository: Arc<dyn ChargeListRepository>,
    events_publisher: Arc<dyn EventPublisher>,
    notifier: Arc<dyn Notifier>,
}

impl ChargeManager {
    pub fn new(resource_id: &str, config: &Configuration,
               item_service: Arc<dyn EligibleItemService>,
               charge_list_repository: Arc<dyn ChargeListRepository>,
               events_publisher: Arc<dyn EventPublisher>,
               notifier: Arc<dyn Notifier>) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            policy: config.loan_policy(),
            max_conflict_retries: config.max_conflict_retries,
            item_service,
            charge_list_repository,
            events_publisher,
            notifier,
        }
    }

    async fn item_ids(&self) -> LibraryResult<Vec<String>> {
        self.item_service.item_ids(self.resource_id.as_str()).await
    }

    // a missing ledger is an empty one that has not been persisted yet
    async fn load(&self) -> LibraryResult<(ResourceChargeList, bool)> {
        match self.charge_list_repository.get(self.resource_id.as_str()).await {
            Ok(charge_list) => Ok((charge_list, true)),
            Err(err) if err.is_not_found() => Ok((ResourceChargeList::new(self.resource_id.as_str()), false)),
            Err(err) => Err(err),
        }
    }

    async fn mutate<T, F>(&self, operation: &str, transform: F) -> LibraryResult<T>
        where T: Send, F: Fn(&mut ResourceChargeList, NaiveDateTime) -> LibraryResult<Transition<T>> + Send + Sync {
        let mut attempt = 0;
        loop {
            let (mut charge_list, persisted) = self.load().await?;
            let transition = transform(&mut charge_list, Utc::now().naive_utc())?;
            if !transition.changed() {
                debug!(resource_id = self.resource_id.as_str(), operation, "ledger unchanged");
                return Ok(transition.outcome);
            }
            let saved = if persisted {
                self.charge_list_repository.update(&charge_list).await
            } else {
                self.charge_list_repository.create(&charge_list).await
            };
            match saved {
                Ok(_) => {
                    info!(resource_id = self.resource_id.as_str(), operation,
                        version = charge_list.version, effects = transition.effects.len(), "ledger saved");
                    self.dispatch(&transition.effects).await;
                    return Ok(transition.outcome);
                }
                Err(err) if err.is_conflict() && attempt < self.max_conflict_retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    warn!(resource_id = self.resource_id.as_str(), operation, attempt,
                        "version conflict, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
                Err(err) if err.is_conflict() => {
                    return Err(LibraryError::version_conflict(
                        format!("{} on {} gave up after {} retries: {}",
                                operation, self.resource_id, attempt, err).as_str()));
                }
                Err(err) => return Err(err),
            }
        }
    }

    // events and notifications follow the commit and never undo it
    async fn dispatch(&self, effects: &[LedgerEffect]) {
        for effect in effects {
            match effect.to_event(self.resource_id.as_str()) {
                Ok(event) => {
                    if let Err(err) = self.events_publisher.publish(&event).await {
                        warn!(resource_id = self.resource_id.as_str(), event = effect.name(),
                            "failed to publish event {}", err);
                    }
                }
                Err(err) => {
                    warn!(resource_id = self.resource_id.as_str(), event = effect.name(),
                        "failed to build event {}", err);
                }
            }
            if let Some(template) = effect.notification() {
                if let Err(err) = self.notifier.deliver(effect.netid(), template, self.resource_id.as_str()).await {
                    warn!(resource_id = self.resource_id.as_str(), netid = effect.netid(),
                        "failed to notify patron {}", err);
                }
            }
        }
    }
}

fn backoff(attempt: usize) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..BACKOFF_STEP_MILLIS);
    Duration::from_millis(BACKOFF_STEP_MILLIS * attempt as u64 + jitter)
}

#[async_trait]
impl ChargeService for ChargeManager {
    fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    async fn eligible(&self) -> LibraryResult<bool> {
        Ok(!self.item_ids().await?.is_empty())
    }

    async fn available_for_charge(&self, netid: &str) -> LibraryResult<bool> {
        let item_ids = self.item_ids().await?;
        let (charge_list, _) = self.load().await?;
        Ok(charge_list.available_for_charge(netid, &item_ids, Utc::now().naive_utc()))
    }

    async fn create_charge(&self, netid: &str) -> LibraryResult<ChargedItem> {
        let item_ids = self.item_ids().await?;
        let policy = self.policy;
        self.mutate("create_charge", |charge_list, now| {
            charge_list.charge(netid, &item_ids, now, &policy)
        }).await
    }

    async fn create_hold(&self, netid: &str) -> LibraryResult<HoldOutcome> {
        let item_ids = self.item_ids().await?;
        let policy = self.policy;
        self.mutate("create_hold", |charge_list, now| {
            charge_list.place_hold(netid, &item_ids, now, &policy)
        }).await
    }

    async fn activate_holds(&self) -> LibraryResult<LedgerSummary> {
        let item_ids = self.item_ids().await?;
        let policy = self.policy;
        self.mutate("activate_holds", |charge_list, now| {
            Ok(charge_list.activate_holds(&item_ids, now, &policy))
        }).await
    }

    async fn expire_charges(&self) -> LibraryResult<LedgerSummary> {
        self.mutate("expire_charges", |charge_list, now| {
            Ok(charge_list.expire_all(now))
        }).await
    }

    async fn return_charge(&self, netid: &str) -> LibraryResult<ChargedItem> {
        self.mutate("return_charge", |charge_list, now| {
            charge_list.return_charge(netid, now)
        }).await
    }

    async fn charge_list(&self) -> LibraryResult<ResourceChargeList> {
        let (charge_list, _) = self.load().await?;
        Ok(charge_list.lazily_expired(Utc::now().naive_utc()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use crate::charges::domain::ChargeService;
    use crate::charges::domain::ledger::HoldOutcome;
    use crate::charges::domain::model::{ChargedItem, Hold, HoldState, ResourceChargeList};
    use crate::charges::domain::service::ChargeManager;
    use crate::charges::repository::memory_charge_list_repository::MemoryChargeListRepository;
    use crate::core::domain::Configuration;
    use crate::core::events::DomainEvent;
    use crate::core::library::{LibraryError, LibraryResult};
    use crate::core::repository::Repository;
    use crate::gateway::events::EventPublisher;
    use crate::gateway::memory::publisher::MemoryPublisher;
    use crate::gateway::notifier::{EventNotifier, NOTIFICATION_EVENT};
    use crate::items::EligibleItemService;
    use crate::items::static_item_service::StaticItemService;

    struct Fixture {
        items: Arc<StaticItemService>,
        repo: Arc<MemoryChargeListRepository>,
        publisher: Arc<MemoryPublisher>,
    }

    impl Fixture {
        fn new(item_ids: &[&str]) -> Self {
            Self {
                items: Arc::new(StaticItemService::with_items("work1", item_ids)),
                repo: Arc::new(MemoryChargeListRepository::new()),
                publisher: Arc::new(MemoryPublisher::new()),
            }
        }

        fn manager(&self) -> ChargeManager {
            ChargeManager::new("work1", &Configuration::new("test"), self.items.clone(), self.repo.clone(),
                               self.publisher.clone(), Arc::new(EventNotifier::new(self.publisher.clone())))
        }
    }

    struct FailingItemService {}

    #[async_trait]
    impl EligibleItemService for FailingItemService {
        async fn item_ids(&self, _resource_id: &str) -> LibraryResult<Vec<String>> {
            Err(LibraryError::catalog_unavailable("catalog is down", Some("503".to_string())))
        }
    }

    struct FailingPublisher {}

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _event: &DomainEvent) -> Result<(), LibraryError> {
            Err(LibraryError::runtime("publisher is down", None))
        }
    }

    #[tokio::test]
    async fn test_should_charge_when_holding_an_available_work() {
        let fixture = Fixture::new(&["i1"]);
        let manager = fixture.manager();
        assert!(manager.eligible().await.expect("should check"));
        assert!(manager.available_for_charge("alice").await.expect("should check"));

        let outcome = manager.create_hold("alice").await.expect("should hold");
        assert!(matches!(outcome, HoldOutcome::Charged(ref item) if item.netid == "alice" && item.item_id == "i1"));
        let stored = fixture.repo.get("work1").await.expect("should get");
        assert!(stored.hold_queue.is_empty());
        assert_eq!(1, stored.charged_items.len());
        assert_eq!(1, fixture.publisher.events_named("charge").await.len());
    }

    #[tokio::test]
    async fn test_should_queue_hold_when_charged_out() {
        let fixture = Fixture::new(&["i1"]);
        let manager = fixture.manager();
        manager.create_charge("bob").await.expect("should charge");

        let outcome = manager.create_hold("alice").await.expect("should hold");
        assert!(matches!(outcome, HoldOutcome::Queued { position: 1, ref hold } if hold.state == HoldState::Inactive));
        assert!(!manager.available_for_charge("alice").await.expect("should check"));
        assert!(matches!(manager.create_charge("alice").await, Err(LibraryError::UnavailableForCharge { .. })));
        assert!(matches!(manager.create_hold("alice").await, Err(LibraryError::HoldExists { .. })));

        let events = fixture.publisher.events_named("hold_created").await;
        assert_eq!(1, events.len());
        assert_eq!(Some("alice"), events[0].metadata_value("netid"));
    }

    #[tokio::test]
    async fn test_should_not_write_idempotent_charge() {
        let fixture = Fixture::new(&["i1", "i2"]);
        let manager = fixture.manager();
        let first = manager.create_charge("alice").await.expect("should charge");
        let before = fixture.repo.get("work1").await.expect("should get");

        let second = manager.create_charge("alice").await.expect("should charge");
        assert_eq!(first, second);
        let after = fixture.repo.get("work1").await.expect("should get");
        assert_eq!(before.version, after.version);
        assert_eq!(before.updated_at, after.updated_at);
        assert_eq!(1, fixture.publisher.events_named("charge").await.len());

        let held = manager.create_hold("alice").await.expect("should hold");
        assert_eq!(HoldOutcome::Charged(first), held);
    }

    #[tokio::test]
    async fn test_should_fail_return_without_charge() {
        let fixture = Fixture::new(&["i1"]);
        let manager = fixture.manager();
        manager.create_hold("alice").await.expect("should hold");
        let before = fixture.repo.get("work1").await.expect("should get");

        let res = manager.return_charge("bob").await;
        assert!(matches!(res, Err(LibraryError::NotCharged { .. })));
        let after = fixture.repo.get("work1").await.expect("should get");
        assert_eq!(before.version, after.version);
        assert_eq!(before.updated_at, after.updated_at);
    }

    #[tokio::test]
    async fn test_should_return_charge_without_reoffer() {
        let fixture = Fixture::new(&["i1"]);
        let manager = fixture.manager();
        manager.create_charge("bob").await.expect("should charge");
        manager.create_hold("alice").await.expect("should hold");

        let returned = manager.return_charge("bob").await.expect("should return");
        assert_eq!("bob", returned.netid.as_str());
        let charge_list = manager.charge_list().await.expect("should load");
        assert!(charge_list.charged_items.is_empty());
        assert!(charge_list.hold_queue[0].is_inactive());
        assert_eq!(1, fixture.publisher.events_named("charge_returned").await.len());

        let summary = manager.activate_holds().await.expect("should activate");
        assert_eq!(1, summary.activated_holds);
        assert!(manager.available_for_charge("alice").await.expect("should check"));
        let item = manager.create_charge("alice").await.expect("should charge");
        assert_eq!("i1", item.item_id.as_str());
        assert_eq!(1, fixture.publisher.events_named("hold_converted").await.len());
    }

    #[tokio::test]
    async fn test_should_activate_and_notify_after_expiry() {
        let fixture = Fixture::new(&["i1"]);
        let now = Utc::now().naive_utc();
        let mut charge_list = ResourceChargeList::new("work1");
        charge_list.charged_items.push(ChargedItem::new("i1", "bob", now - Duration::minutes(1)));
        charge_list.hold_queue.push(Hold::new("alice", now - Duration::hours(1)));
        fixture.repo.create(&charge_list).await.expect("should create");
        let manager = fixture.manager();

        let expired = manager.expire_charges().await.expect("should expire");
        assert_eq!(1, expired.expired_charges);
        let activated = manager.activate_holds().await.expect("should activate");
        assert_eq!(1, activated.activated_holds);

        let stored = fixture.repo.get("work1").await.expect("should get");
        assert!(stored.charged_items.is_empty());
        assert!(stored.hold_queue[0].is_active(Utc::now().naive_utc()));
        let notifications = fixture.publisher.events_named(NOTIFICATION_EVENT).await;
        assert_eq!(1, notifications.len());
        assert_eq!(Some("alice"), notifications[0].metadata_value("netid"));
        assert_eq!(Some("hold_activated"), notifications[0].metadata_value("template"));
        assert_eq!(1, fixture.publisher.events_named("charge_expired").await.len());
    }

    #[tokio::test]
    async fn test_should_surface_catalog_failure() {
        let fixture = Fixture::new(&["i1"]);
        let manager = ChargeManager::new("work1", &Configuration::new("test"), Arc::new(FailingItemService {}),
                                         fixture.repo.clone(), fixture.publisher.clone(),
                                         Arc::new(EventNotifier::new(fixture.publisher.clone())));
        assert!(matches!(manager.eligible().await, Err(LibraryError::CatalogUnavailable { .. })));
        assert!(matches!(manager.available_for_charge("alice").await, Err(LibraryError::CatalogUnavailable { .. })));
        assert!(matches!(manager.create_hold("alice").await, Err(LibraryError::CatalogUnavailable { .. })));
        assert!(fixture.repo.get("work1").await.is_err());
    }

    #[tokio::test]
    async fn test_should_not_charge_ineligible_work() {
        let fixture = Fixture::new(&[]);
        let manager = fixture.manager();
        assert!(!manager.eligible().await.expect("should check"));
        assert!(!manager.available_for_charge("alice").await.expect("should check"));
        assert!(matches!(manager.create_charge("alice").await, Err(LibraryError::UnavailableForCharge { .. })));
    }

    #[tokio::test]
    async fn test_should_commit_despite_publisher_failure() {
        let fixture = Fixture::new(&["i1"]);
        let failing: Arc<dyn EventPublisher> = Arc::new(FailingPublisher {});
        let manager = ChargeManager::new("work1", &Configuration::new("test"), fixture.items.clone(),
                                         fixture.repo.clone(), failing.clone(), Arc::new(EventNotifier::new(failing)));
        let item = manager.create_charge("alice").await.expect("should charge");
        assert_eq!("alice", item.netid.as_str());
        assert_eq!(1, fixture.repo.get("work1").await.expect("should get").charged_items.len());
    }

    #[tokio::test]
    async fn test_should_read_lazily_expired_charge_list() {
        let fixture = Fixture::new(&["i1"]);
        let manager = fixture.manager();
        assert!(manager.charge_list().await.expect("should load").charged_items.is_empty());

        let mut charge_list = ResourceChargeList::new("work1");
        charge_list.charged_items.push(ChargedItem::new("i1", "bob", Utc::now().naive_utc() - Duration::minutes(1)));
        fixture.repo.create(&charge_list).await.expect("should create");
        assert!(manager.charge_list().await.expect("should load").charged_items.is_empty());
        assert_eq!(1, fixture.repo.get("work1").await.expect("should get").charged_items.len());
        assert!(manager.available_for_charge("alice").await.expect("should check"));
    }

    #[tokio::test]
    async fn test_should_bound_concurrent_charges_by_slots() {
        let fixture = Fixture::new(&["i1", "i2"]);
        let mut config = Configuration::new("test");
        config.max_conflict_retries = 50;
        let mut handles = vec![];
        for i in 0..10 {
            let manager = ChargeManager::new("work1", &config, fixture.items.clone(), fixture.repo.clone(),
                                             fixture.publisher.clone(), Arc::new(EventNotifier::new(fixture.publisher.clone())));
            handles.push(tokio::spawn(async move {
                manager.create_charge(format!("patron{}", i).as_str()).await
            }));
        }
        let mut charged = 0;
        for handle in handles {
            match handle.await.expect("should join") {
                Ok(_) => charged += 1,
                Err(err) => assert!(matches!(err, LibraryError::UnavailableForCharge { .. })),
            }
        }
        assert_eq!(2, charged);
        let stored = fixture.repo.get("work1").await.expect("should get");
        assert_eq!(2, stored.charged_items.len());
        assert_ne!(stored.charged_items[0].item_id, stored.charged_items[1].item_id);
    }
}
