pub mod dashboard;
pub mod directory;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_gateway::ClinicClient;

use dashboard::DashboardService;
use directory::DirectoryService;

pub struct DirectoryState {
    pub config: Arc<AppConfig>,
    pub directory: DirectoryService,
    pub dashboard: DashboardService,
}

impl DirectoryState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let gateway = ClinicClient::new(&config);

        Self {
            directory: DirectoryService::new(gateway.clone()),
            dashboard: DashboardService::new(gateway),
            config,
        }
    }
}
