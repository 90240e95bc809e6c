pub mod counter_repo;
pub mod preference_repo;

pub use counter_repo::DeliveryCounterRepo;
pub use preference_repo::PreferenceRepo;
