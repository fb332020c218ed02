pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod repository;
pub mod services;
