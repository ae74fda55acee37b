//! Storage implementations for different backends

pub mod in_memory;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;

pub use in_memory::InMemoryStore;
#[cfg(feature = "mongodb_backend")]
pub use mongodb::MongoStore;

use crate::config::{CatalogEntry, StorageBackend, StorageConfig};
use crate::core::error::StorageError;
use crate::core::repository::{ProductRepository, Repositories};
use anyhow::Result;

/// Open the backend selected by `config`
pub async fn connect(config: &StorageConfig) -> Result<Repositories> {
    match config.backend {
        StorageBackend::InMemory => {
            tracing::info!("using in-memory storage");
            Ok(Repositories::from_store(InMemoryStore::new()))
        }
        #[cfg(feature = "mongodb_backend")]
        StorageBackend::Mongodb => {
            tracing::info!(database = %config.database, "connecting to MongoDB");
            let store = MongoStore::connect(&config.mongo_uri, &config.database)
                .await
                .map_err(|e| StorageError::ConnectionError {
                    backend: "mongodb".to_string(),
                    message: format!("{:#}", e),
                })?;
            Ok(Repositories::from_store(store))
        }
        #[cfg(not(feature = "mongodb_backend"))]
        StorageBackend::Mongodb => Err(StorageError::ConnectionError {
            backend: "mongodb".to_string(),
            message: "built without the `mongodb_backend` feature".to_string(),
        }
        .into()),
    }
}

/// Insert (or replace) the configured catalog products
pub async fn seed_catalog(products: &dyn ProductRepository, catalog: &[CatalogEntry]) -> Result<usize> {
    for entry in catalog {
        products.save(entry.to_product()).await?;
    }
    if !catalog.is_empty() {
        tracing::info!(count = catalog.len(), "catalog seeded");
    }
    Ok(catalog.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_connect_in_memory_and_seed() {
        let repositories = connect(&StorageConfig::default()).await.unwrap();
        let id = Uuid::new_v4();
        let seller = Uuid::new_v4();
        let catalog = vec![CatalogEntry {
            id,
            title: "Kettle".to_string(),
            description: None,
            price: Decimal::from(30),
            seller,
        }];

        let seeded = seed_catalog(repositories.products.as_ref(), &catalog).await.unwrap();
        assert_eq!(seeded, 1);

        let product = repositories.products.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(product.title, "Kettle");

        // a restart seeds the same catalog again
        seed_catalog(repositories.products.as_ref(), &catalog).await.unwrap();
        let listed = repositories.products.find_by_seller(&seller).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
    }

    #[cfg(not(feature = "mongodb_backend"))]
    #[tokio::test]
    async fn test_mongodb_without_feature_is_a_connection_error() {
        let config = StorageConfig {
            backend: StorageBackend::Mongodb,
            ..StorageConfig::default()
        };
        let err = connect(&config).await.err().unwrap();

        let storage = err.downcast_ref::<StorageError>().unwrap();
        assert!(matches!(storage, StorageError::ConnectionError { backend, .. } if backend == "mongodb"));
        assert!(err.to_string().starts_with("Failed to connect to mongodb"));
    }
}
