#![forbid(unsafe_code)]

pub mod builtin;
pub mod repository;
pub mod snapshot;
pub mod sqlite;
