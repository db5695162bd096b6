pub mod allocator;
pub mod config;
pub mod context;
pub mod convert;
pub mod document;
pub mod error;
pub mod io;
pub mod markdown;
pub mod paths;
pub mod store;
pub mod story;

pub use error::{RalphError, Result};
