pub mod propagator;

pub use propagator::{IntegrationMethod, Propagator};
