//! In-process backend for the ephemeral and persistent client kinds

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;

use super::{ChromaBackend, ClientOptions};
use crate::config::{ClientConfig, ClientKind, DEFAULT_DATA_DIR};
use crate::core::catalog::{validate_collection_name, Catalog};
use crate::error::{Error, Result};
use crate::remote::Collection;

/// Collection catalog kept in process
///
/// Uses Mutex so the handle stays `Sync`
pub struct LocalClient {
    catalog: Mutex<Catalog>,
    kind: ClientKind,
    options: ClientOptions,
}

impl LocalClient {
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let (tenant, database) = (&config.tenant, &config.database);
        let catalog = match config.kind {
            ClientKind::Persistent => {
                let dir = config
                    .data_dir
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DATA_DIR.into());
                let catalog = Catalog::open(&dir, tenant, database)
                    .map_err(|e| Error::ClientConstruction(format!("{:#}", e)))?;
                info!("Opened persistent catalog in {}", dir.display());
                catalog
            }
            ClientKind::Ephemeral => Catalog::open_memory(tenant, database)
                .map_err(|e| Error::ClientConstruction(format!("{:#}", e)))?,
            other => {
                return Err(Error::ClientConstruction(format!(
                    "{} is not an in-process client kind",
                    other
                )))
            }
        };

        Ok(Self {
            catalog: Mutex::new(catalog),
            kind: config.kind,
            options: ClientOptions::from_config(config),
        })
    }

    fn catalog(&self) -> Result<MutexGuard<'_, Catalog>> {
        self.catalog
            .lock()
            .map_err(|e| Error::Backend(format!("Lock error: {}", e)))
    }
}

fn catalog_error(err: anyhow::Error) -> Error {
    Error::Backend(format!("{:#}", err))
}

impl ChromaBackend for LocalClient {
    fn kind(&self) -> ClientKind {
        self.kind
    }

    fn heartbeat(&self) -> Result<u64> {
        self.catalog()?.count().map_err(catalog_error)?;
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Ok(nanos.max(0) as u64)
    }

    fn version(&self) -> Result<String> {
        Ok(format!("{} (local catalog)", env!("CARGO_PKG_VERSION")))
    }

    fn list_collections(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Collection>> {
        self.catalog()?.list(limit, offset).map_err(catalog_error)
    }

    fn create_collection(&self, name: &str, metadata: Option<Map<String, Value>>) -> Result<Collection> {
        validate_collection_name(name).map_err(Error::InvalidCollectionName)?;
        let metadata = self.options.metadata_for(metadata);
        let (collection, created) = self
            .catalog()?
            .get_or_create(name, &metadata)
            .map_err(catalog_error)?;
        if created {
            info!("Created collection '{}'", name);
        }
        Ok(collection)
    }

    fn get_collection(&self, name: &str) -> Result<Collection> {
        self.catalog()?
            .get(name)
            .map_err(catalog_error)?
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        if self.catalog()?.delete(name).map_err(catalog_error)? {
            Ok(())
        } else {
            Err(Error::CollectionNotFound(name.to_string()))
        }
    }

    fn count_collections(&self) -> Result<usize> {
        self.catalog()?.count().map_err(catalog_error)
    }

    fn reset(&self) -> Result<()> {
        self.options.check_reset()?;
        self.catalog()?.reset().map_err(catalog_error)?;
        info!("Reset local catalog");
        Ok(())
    }
}
