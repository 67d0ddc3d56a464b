//! Application orchestration module

pub mod initialization;
pub mod execution;
pub mod repository;

pub use repository::resolve_repository_path;
pub use initialization::{
    load_configuration,
    configure_logging,
    build_pipeline_settings,
};
pub use execution::run_pipeline;
