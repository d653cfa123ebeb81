#![forbid(unsafe_code)]

pub mod credentials;
pub mod repository;
pub mod sqlite;
