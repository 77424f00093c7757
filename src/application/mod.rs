// Application layer - Use cases and boundary traits
pub mod credential_store;
pub mod poll_service;
pub mod vehicle_gateway;
