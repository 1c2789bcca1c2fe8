pub mod catalog;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_gateway::ClinicClient;

use catalog::CatalogService;

pub struct CatalogState {
    pub config: Arc<AppConfig>,
    pub catalog: CatalogService,
}

impl CatalogState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let gateway = ClinicClient::new(&config);

        Self {
            catalog: CatalogService::new(gateway),
            config,
        }
    }
}
