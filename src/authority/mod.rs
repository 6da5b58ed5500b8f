//! External authority integration

pub mod client;

pub use client::{Authority, AuthorityClient, AuthorityError};
