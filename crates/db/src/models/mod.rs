pub mod counter;
pub mod preference;
