//! Device capabilities the services depend on: geolocation and the photo picker.

use async_trait::async_trait;

use cook_core::model::{GeoPoint, ImageRef};

/// Outcome of a permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Source of the device position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Prompt for (or report the already granted) foreground location permission.
    async fn request_permission(&self) -> PermissionStatus;

    /// Whether location services are switched on at the OS level.
    async fn services_enabled(&self) -> bool;

    /// Current position.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when no fix can be obtained.
    async fn current_position(&self) -> Result<GeoPoint, String>;
}

/// Source of a profile photo chosen by the user.
#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    /// The picked image, or `None` if the user cancelled.
    async fn pick_image(&self) -> Option<ImageRef>;
}

/// Fixed-answer location provider for the CLI and tests.
#[derive(Debug, Clone)]
pub struct StaticLocation {
    pub permission: PermissionStatus,
    pub enabled: bool,
    pub position: Option<GeoPoint>,
}

impl StaticLocation {
    #[must_use]
    pub fn at(position: GeoPoint) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            enabled: true,
            position: Some(position),
        }
    }

    #[must_use]
    pub fn denied() -> Self {
        Self {
            permission: PermissionStatus::Denied,
            enabled: true,
            position: None,
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            permission: PermissionStatus::Granted,
            enabled: false,
            position: None,
        }
    }
}

#[async_trait]
impl LocationProvider for StaticLocation {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn services_enabled(&self) -> bool {
        self.enabled
    }

    async fn current_position(&self) -> Result<GeoPoint, String> {
        self.position.ok_or_else(|| "no position fix".to_string())
    }
}

/// Fixed-answer photo picker.
#[derive(Debug, Clone)]
pub struct StaticPicker {
    pub permission: PermissionStatus,
    pub picked: Option<ImageRef>,
}

#[async_trait]
impl ImagePicker for StaticPicker {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn pick_image(&self) -> Option<ImageRef> {
        self.picked.clone()
    }
}
