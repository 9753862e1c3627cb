use std::sync::Arc;
use crate::charges::domain::ChargeService;
use crate::charges::domain::service::ChargeManager;
use crate::charges::repository::ChargeListRepository;
use crate::charges::repository::ddb_charge_list_repository::DDBChargeListRepository;
use crate::charges::repository::memory_charge_list_repository::MemoryChargeListRepository;
use crate::core::domain::Configuration;
use crate::core::library::LibraryResult;
use crate::core::repository::RepositoryStore;
use crate::gateway::events::EventPublisher;
use crate::gateway::factory::{create_notifier, create_publisher};
use crate::gateway::notifier::Notifier;
use crate::items::EligibleItemService;
use crate::items::factory::create_item_service;
use crate::utils::ddb::{build_db_client, create_table};

pub async fn create_charge_list_repository(config: &Configuration, store: RepositoryStore) -> Arc<dyn ChargeListRepository> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Arc::new(DDBChargeListRepository::new(client, config.charge_list_table.as_str()))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, config.charge_list_table.as_str(), "resource_id").await;
            Arc::new(DDBChargeListRepository::new(client, config.charge_list_table.as_str()))
        }
        RepositoryStore::Memory => {
            Arc::new(MemoryChargeListRepository::new())
        }
    }
}

// ChargeManagerFactory holds the shared collaborators and builds one manager per work
#[derive(Clone)]
pub struct ChargeManagerFactory {
    config: Configuration,
    item_service: Arc<dyn EligibleItemService>,
    charge_list_repository: Arc<dyn ChargeListRepository>,
    events_publisher: Arc<dyn EventPublisher>,
    notifier: Arc<dyn Notifier>,
}

impl ChargeManagerFactory {
    pub fn new(config: &Configuration,
               item_service: Arc<dyn EligibleItemService>,
               charge_list_repository: Arc<dyn ChargeListRepository>,
               events_publisher: Arc<dyn EventPublisher>,
               notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config: config.clone(),
            item_service,
            charge_list_repository,
            events_publisher,
            notifier,
        }
    }

    pub fn create_charge_manager(&self, resource_id: &str) -> Box<dyn ChargeService> {
        Box::new(ChargeManager::new(resource_id, &self.config, self.item_service.clone(),
                                    self.charge_list_repository.clone(), self.events_publisher.clone(),
                                    self.notifier.clone()))
    }

    pub fn charge_list_repository(&self) -> Arc<dyn ChargeListRepository> {
        self.charge_list_repository.clone()
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }
}

pub async fn create_charge_manager_factory(config: &Configuration, store: RepositoryStore) -> LibraryResult<ChargeManagerFactory> {
    let item_service = create_item_service(config)?;
    let charge_list_repository = create_charge_list_repository(config, store).await;
    let publisher = create_publisher(config, store.gateway_publisher()).await;
    let notifier = create_notifier(publisher.clone());
    Ok(ChargeManagerFactory::new(config, item_service, charge_list_repository, publisher, notifier))
}

// in-process factory with a fixed set of items for a single work
#[cfg(test)]
pub(crate) fn memory_charge_manager_factory(resource_id: &str, item_ids: &[&str])
    -> (ChargeManagerFactory, Arc<crate::gateway::memory::publisher::MemoryPublisher>) {
    use crate::gateway::memory::publisher::MemoryPublisher;
    use crate::items::static_item_service::StaticItemService;
    let publisher = Arc::new(MemoryPublisher::new());
    let factory = ChargeManagerFactory::new(&Configuration::new("test"),
                                            Arc::new(StaticItemService::with_items(resource_id, item_ids)),
                                            Arc::new(MemoryChargeListRepository::new()),
                                            publisher.clone(),
                                            create_notifier(publisher.clone()));
    (factory, publisher)
}
