// Route exports
pub mod family;
pub mod matching;

use crate::core::DiscoveryQueue;
use crate::services::{BackendClient, CacheManager, NotificationClient, PostgresClient};
use actix_web::web;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub cache: Arc<CacheManager>,
    pub postgres: Arc<PostgresClient>,
    pub notifier: Arc<NotificationClient>,
    pub queue: DiscoveryQueue,
    pub default_required_votes: u32,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matching::configure)
            .configure(family::configure),
    );
}
