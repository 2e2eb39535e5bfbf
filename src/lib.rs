//! Walk-in queue for a barbershop: customers wait in a FIFO line, barbers
//! call the next customer, and wait estimates follow every change.

pub mod config;
pub mod dto;
pub mod handlers;
pub mod interceptors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

pub use config::AppState;
pub use routes::create_router;
