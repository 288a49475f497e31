pub mod debounce;
pub mod logging;

pub use debounce::Debouncer;
