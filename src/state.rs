use std::sync::Arc;

use crate::auth::{AuthProvider, SessionResolver};
use crate::backend::DocumentStore;
use crate::notify::Notifier;
use crate::observability::metrics::Metrics;
use crate::services::accounts::AccountService;
use crate::services::directory::Directory;
use crate::services::dispatch::DispatchService;
use crate::services::reader::CollectionReader;
use crate::view::dashboard::Dashboard;
use crate::view::driver_board::DriverBoard;
use crate::view::route_manager::RouteManager;
use crate::view::summary::DriverSummary;

/// One client session's worth of services and view-models, wired to the
/// backends passed in.
pub struct AppState {
    pub session: SessionResolver,
    pub accounts: AccountService,
    pub dispatches: DispatchService,
    pub directory: Directory,
    pub driver_board: DriverBoard,
    pub driver_summary: DriverSummary,
    pub route_manager: RouteManager,
    pub dashboard: Dashboard,
    pub notifier: Notifier,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        notice_buffer_size: usize,
    ) -> Self {
        let metrics = Metrics::new();
        let notifier = Notifier::new(notice_buffer_size);
        let reader = CollectionReader::new(store, metrics.clone());

        let session = SessionResolver::new(auth.clone(), reader.clone());
        let accounts = AccountService::new(auth, reader.clone(), session.clone());
        let dispatches = DispatchService::new(reader.clone(), metrics.clone());
        let directory = Directory::new(reader);

        Self {
            driver_board: DriverBoard::new(
                session.clone(),
                dispatches.clone(),
                notifier.clone(),
                metrics.clone(),
            ),
            driver_summary: DriverSummary::new(
                session.clone(),
                dispatches.clone(),
                notifier.clone(),
                metrics.clone(),
            ),
            route_manager: RouteManager::new(
                dispatches.clone(),
                directory.clone(),
                notifier.clone(),
                metrics.clone(),
            ),
            dashboard: Dashboard::new(
                dispatches.clone(),
                directory.clone(),
                notifier.clone(),
                metrics.clone(),
            ),
            session,
            accounts,
            dispatches,
            directory,
            notifier,
            metrics,
        }
    }

    /// Drops every view's data; called whenever the signed-in identity
    /// changes.
    pub async fn reset_views(&self) {
        self.driver_board.reset().await;
        self.driver_summary.reset().await;
        self.route_manager.reset().await;
        self.dashboard.reset().await;
    }
}
