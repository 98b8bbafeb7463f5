// Estate Auth Service Library

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod security;
pub mod services;

#[cfg(test)]
mod tests;

pub use error::{AuthError, Result};

#[derive(Clone)]
pub struct AppState {
    pub auth: services::AuthService,
}
