pub mod advice;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod provider;
pub mod recommend;
pub mod soil;
pub mod state;
pub mod trends;
