#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod filter;
pub mod model;
pub mod stats;
pub mod time;

pub use catalog::Catalog;
pub use error::Error;
pub use filter::{FilterState, filter_modules};
pub use time::Clock;
