//! SeaORM entities for the member workspace plus connection helpers.

pub mod db;
pub mod member;
pub mod member_login_log;
