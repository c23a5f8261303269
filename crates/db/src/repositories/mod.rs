//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod binding_repo;
pub mod counter_repo;
pub mod global_config_repo;
pub mod mission_repo;
pub mod profile_repo;

pub use binding_repo::BindingRepo;
pub use counter_repo::CounterRepo;
pub use global_config_repo::GlobalConfigRepo;
pub use mission_repo::MissionRepo;
pub use profile_repo::ProfileRepo;
