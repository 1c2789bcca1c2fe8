pub mod availability;
pub mod draft;
pub mod holds;
pub mod lifecycle;
pub mod slots;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_gateway::ClinicClient;

use availability::AvailabilityService;
use draft::DraftStore;
use holds::HoldStore;
use lifecycle::LifecycleService;

/// Per-process state of the scheduling cell. Drafts and holds outlive a
/// single request, so they live here rather than being rebuilt per call.
pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub availability: AvailabilityService,
    pub holds: Arc<HoldStore>,
    pub drafts: DraftStore,
    pub lifecycle: LifecycleService,
}

impl SchedulingState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let gateway = ClinicClient::new(&config);
        let holds = Arc::new(HoldStore::new());

        Self {
            availability: AvailabilityService::new(gateway.clone()),
            drafts: DraftStore::new(gateway.clone(), Arc::clone(&holds)),
            lifecycle: LifecycleService::new(gateway),
            holds,
            config,
        }
    }
}
