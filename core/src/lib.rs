pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod persist;
pub mod processor;
pub mod service;
pub mod util;
