#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod catalog_service;
pub mod cooking;
pub mod device;
pub mod error;
pub mod map_service;
pub mod session;

pub use cook_core::Clock;

pub use app_services::AppServices;
pub use auth_service::AuthService;
pub use catalog_service::{CatalogService, filter_by_category};
pub use cooking::{
    Completion, CookingTracker, InFlight, StatusWatch, StepWalker, WalkerSettings, WalkerView,
};
pub use device::{ImagePicker, LocationProvider, PermissionStatus, StaticLocation, StaticPicker};
pub use error::{
    AppServicesError, AuthError, Capability, CatalogError, CookingError, MapError, Notice,
    Remediation,
};
pub use map_service::{MapService, MapView, Region};
pub use session::{SessionContext, SessionUser};
