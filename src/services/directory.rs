use serde::Serialize;
use tracing::debug;

use super::reader::CollectionReader;
use crate::backend::collections::{DRIVERS, STORES};
use crate::backend::Query;
use crate::error::AppError;
use crate::models::driver::DriverProfile;
use crate::models::reference::{ReferenceItem, ReferenceKind};
use crate::models::store::Store;

/// Every reference list a dispatch form needs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormOptions {
    pub drivers: Vec<DriverProfile>,
    pub stores: Vec<Store>,
    pub vehicles: Vec<ReferenceItem>,
    pub load_types: Vec<ReferenceItem>,
    pub shifts: Vec<ReferenceItem>,
    pub rounds: Vec<ReferenceItem>,
    pub management_types: Vec<ReferenceItem>,
    pub statuses: Vec<ReferenceItem>,
}

/// Read access to drivers, stores and the reference lists.
#[derive(Clone)]
pub struct Directory {
    reader: CollectionReader,
}

impl Directory {
    pub fn new(reader: CollectionReader) -> Self {
        Self { reader }
    }

    pub async fn drivers(&self) -> Result<Vec<DriverProfile>, AppError> {
        self.reader.list(DRIVERS, &Query::new()).await
    }

    pub async fn stores(&self) -> Result<Vec<Store>, AppError> {
        self.reader.list(STORES, &Query::new()).await
    }

    /// Stores whose display name matches exactly.
    pub async fn stores_named(&self, name: &str) -> Result<Vec<Store>, AppError> {
        self.reader
            .list(STORES, &Query::new().where_eq("name", name.trim()))
            .await
    }

    pub async fn reference(&self, kind: ReferenceKind) -> Result<Vec<ReferenceItem>, AppError> {
        self.reader.list(kind.collection(), &Query::new()).await
    }

    /// Loads all lists concurrently; any failure fails the whole load.
    pub async fn form_options(&self) -> Result<FormOptions, AppError> {
        let (drivers, stores, vehicles, load_types, shifts, rounds, management_types, statuses) =
            futures::try_join!(
                self.drivers(),
                self.stores(),
                self.reference(ReferenceKind::Vehicle),
                self.reference(ReferenceKind::LoadType),
                self.reference(ReferenceKind::Shift),
                self.reference(ReferenceKind::Round),
                self.reference(ReferenceKind::ManagementType),
                self.reference(ReferenceKind::StatusLabel),
            )?;

        debug!(
            drivers = drivers.len(),
            stores = stores.len(),
            vehicles = vehicles.len(),
            "form options loaded"
        );

        Ok(FormOptions {
            drivers,
            stores,
            vehicles,
            load_types,
            shifts,
            rounds,
            management_types,
            statuses,
        })
    }
}
