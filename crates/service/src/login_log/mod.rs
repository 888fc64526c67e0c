//! Login audit: append-only login events and their paginated retrieval.

pub mod domain;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::LoginLogService;
