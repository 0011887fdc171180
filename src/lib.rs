//! The `bookshelf` library crate.
//!
//! A REST API over authors and books: paginated, filterable, sortable listings
//! with optional relation inclusion, and JWT-protected writes. `main.rs` wires
//! the Postgres repositories into the routes defined here.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod pagination;
pub mod repositories;
pub mod routes;
pub mod services;

pub use error::AppError;
