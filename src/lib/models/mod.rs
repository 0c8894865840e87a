pub mod event_routes;
pub mod memory;
