pub mod attitude;
pub mod inertia;

pub use attitude::AttitudeState;
pub use inertia::InertiaTensor;
