pub mod admin;
pub mod app;
pub mod auth;
pub mod blog;
pub mod config;
pub mod error;
pub mod pagination;
pub mod provider;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;
