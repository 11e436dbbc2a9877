pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hierarchy;
pub mod io;
pub mod membership;
pub mod model;
pub mod persons;
pub mod report;
pub mod table;
pub mod validate;

pub use error::{CheckError, Result};
