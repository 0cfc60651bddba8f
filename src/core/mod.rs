pub mod alerts;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod feedback;
pub mod recommendations;
pub mod sentiment;
pub mod services;
#[cfg(test)]
mod testing;
pub mod traits;
