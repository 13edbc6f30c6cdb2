//! Business logic services

pub mod catalog;
pub mod fines;
pub mod lending;
pub mod notifications;
pub mod policy;
pub mod reservations;

use crate::{config::LendingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingService,
    pub reservations: reservations::ReservationService,
    pub fines: fines::FineService,
    pub notifications: notifications::NotificationService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, lending_config: LendingConfig) -> Self {
        let notifications = notifications::NotificationService::new(repository.clone());
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            lending: lending::LendingService::new(
                repository.clone(),
                lending_config.clone(),
                notifications.clone(),
            ),
            reservations: reservations::ReservationService::new(
                repository.clone(),
                lending_config.clone(),
                notifications.clone(),
            ),
            fines: fines::FineService::new(repository, lending_config, notifications.clone()),
            notifications,
        }
    }
}
