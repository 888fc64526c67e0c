//! Member module: accounts, registration events and password handling.
//!
//! Layout follows domain / repository port / storage adapter / service.

pub mod domain;
pub mod events;
pub mod password;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::MemberService;
