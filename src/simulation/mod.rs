pub mod events;
pub mod fleet;
pub mod vehicle;

pub use events::Event;
pub use fleet::{FleetState, InitialLocations, SeatCapacities, Simulation};
pub use vehicle::VehicleState;
