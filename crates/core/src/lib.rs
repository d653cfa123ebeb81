#![forbid(unsafe_code)]

//! Domain model for the cooking companion: users and their cooking sets,
//! read-only recipe and supermarket reference data, and the step paging state.

pub mod error;
pub mod model;
pub mod time;

pub use error::Error;
pub use time::Clock;
