use crate::charges::factory::create_charge_manager_factory;
use crate::core::domain::Configuration;
use crate::core::library::LibraryResult;
use crate::core::repository::RepositoryStore;
use crate::sweep::domain::SweepService;
use crate::sweep::domain::service::BulkHoldProcessor;

pub async fn create_sweep_service(config: &Configuration, store: RepositoryStore) -> LibraryResult<Box<dyn SweepService>> {
    let factory = create_charge_manager_factory(config, store).await?;
    Ok(Box::new(BulkHoldProcessor::new(factory)))
}

#[cfg(test)]
mod tests {
    use crate::core::domain::Configuration;
    use crate::core::repository::RepositoryStore;
    use crate::sweep::factory::create_sweep_service;

    #[tokio::test]
    async fn test_should_sweep_empty_store() {
        let svc = create_sweep_service(&Configuration::new("test"), RepositoryStore::Memory)
            .await.expect("should create sweep");
        let report = svc.process().await.expect("should sweep");
        assert_eq!(0, report.scanned);
    }
}
