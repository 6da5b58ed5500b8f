//! HTTP facade

pub mod routes;

pub use routes::build_router;
