pub mod audit;
pub mod bot;
pub mod registry;
pub mod room;

pub use registry::RoomRegistry;
