//! The install steps, one module each, in the order they run.

pub mod legacy_cleanup;
pub mod module_link;
pub mod packages;
pub mod preflight;
pub mod repository;
pub mod services;
pub mod updater;
pub mod virtualenv;

pub use legacy_cleanup::LegacyCleanupStep;
pub use module_link::ModuleLinkStep;
pub use packages::PackagesStep;
pub use preflight::PreflightStep;
pub use repository::RepositoryStep;
pub use services::ServicesStep;
pub use updater::UpdaterStep;
pub use virtualenv::VirtualenvStep;

use crate::domain::ports::InstallStep;

/// The full installer pipeline.
pub fn default_steps() -> Vec<Box<dyn InstallStep>> {
    vec![
        Box::new(PreflightStep),
        Box::new(PackagesStep),
        Box::new(RepositoryStep),
        Box::new(VirtualenvStep),
        Box::new(LegacyCleanupStep),
        Box::new(ModuleLinkStep),
        Box::new(UpdaterStep),
        Box::new(ServicesStep),
    ]
}
