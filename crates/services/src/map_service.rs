use std::sync::Arc;

use tracing::{info, warn};

use cook_core::model::{GeoPoint, Supermarket};

use crate::catalog_service::CatalogService;
use crate::device::LocationProvider;
use crate::error::{Capability, MapError};

/// Visible map area around a center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub center: GeoPoint,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    pub const DEFAULT_DELTA: f64 = 0.05;

    #[must_use]
    pub fn around(center: GeoPoint) -> Self {
        Self {
            center,
            latitude_delta: Self::DEFAULT_DELTA,
            longitude_delta: Self::DEFAULT_DELTA,
        }
    }
}

/// Everything the map screen draws.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub region: Region,
    pub supermarkets: Vec<Supermarket>,
}

/// Locates the user and loads nearby supermarket markers.
#[derive(Clone)]
pub struct MapService {
    catalog: CatalogService,
    location: Arc<dyn LocationProvider>,
}

impl MapService {
    #[must_use]
    pub fn new(catalog: CatalogService, location: Arc<dyn LocationProvider>) -> Self {
        Self { catalog, location }
    }

    /// Locate the user and load every supermarket.
    ///
    /// # Errors
    ///
    /// Returns `MapError::PermissionDenied` or `LocationDisabled` when the
    /// position cannot be requested, `Position` when no fix is available and
    /// `Catalog` when the markers cannot be read.
    pub async fn load(&self) -> Result<MapView, MapError> {
        let center = self.locate().await?;
        let supermarkets = self.load_markers().await?;
        info!(count = supermarkets.len(), "map loaded");
        Ok(MapView {
            region: Region::around(center),
            supermarkets,
        })
    }

    /// Supermarket markers, independent of the user's position.
    ///
    /// # Errors
    ///
    /// Returns `MapError::Catalog` when the store cannot be read.
    pub async fn load_markers(&self) -> Result<Vec<Supermarket>, MapError> {
        Ok(self.catalog.list_supermarkets().await?)
    }

    async fn locate(&self) -> Result<GeoPoint, MapError> {
        if !self.location.request_permission().await.is_granted() {
            warn!("location permission denied");
            return Err(MapError::PermissionDenied(Capability::Location));
        }
        if !self.location.services_enabled().await {
            warn!("location services disabled");
            return Err(MapError::LocationDisabled);
        }
        self.location
            .current_position()
            .await
            .map_err(MapError::Position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cook_core::model::SupermarketId;
    use storage::repository::{InMemoryRepository, Storage, SupermarketRepository};

    use crate::device::StaticLocation;

    async fn service(location: StaticLocation) -> (MapService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        repo.upsert_supermarket(
            &Supermarket::new(
                SupermarketId::new("s1").unwrap(),
                "Superindo Dago",
                "Jl. Ir. H. Juanda",
                GeoPoint::new(-6.8915, 107.6107).unwrap(),
            )
            .unwrap(),
        )
        .await
        .unwrap();
        let storage = Storage::from_in_memory(repo.clone());
        let catalog = CatalogService::new(storage.recipes, storage.supermarkets);
        (MapService::new(catalog, Arc::new(location)), repo)
    }

    #[tokio::test]
    async fn load_centers_on_the_user() {
        let here = GeoPoint::new(-6.9, 107.6).unwrap();
        let (svc, _) = service(StaticLocation::at(here)).await;
        let view = svc.load().await.unwrap();
        assert_eq!(view.region.center, here);
        assert!((view.region.latitude_delta - 0.05).abs() < f64::EPSILON);
        assert_eq!(view.supermarkets.len(), 1);
    }

    #[tokio::test]
    async fn denied_permission_points_to_settings() {
        let (svc, _) = service(StaticLocation::denied()).await;
        let err = svc.load().await.unwrap_err();
        assert!(matches!(err, MapError::PermissionDenied(Capability::Location)));
        assert!(err.notice().remediation.is_some());
    }

    #[tokio::test]
    async fn disabled_services_are_reported() {
        let (svc, _) = service(StaticLocation::disabled()).await;
        assert!(matches!(svc.load().await, Err(MapError::LocationDisabled)));
    }

    #[tokio::test]
    async fn markers_load_without_a_position() {
        let (svc, _) = service(StaticLocation::denied()).await;
        assert_eq!(svc.load_markers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn offline_store_fails_markers() {
        let (svc, repo) = service(StaticLocation::at(GeoPoint::new(0.0, 0.0).unwrap())).await;
        repo.set_offline(true);
        assert!(matches!(svc.load().await, Err(MapError::Catalog(_))));
    }
}
