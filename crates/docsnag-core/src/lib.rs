pub mod config;
pub mod logging;

pub mod affordance;
pub mod candidate;
pub mod dom;
pub mod downloader;
pub mod error;
pub mod har;
pub mod inspect;
pub mod intercept;
pub mod naming;
pub mod poll;
pub mod progress;
pub mod report;
pub mod save;
pub mod session;
pub mod site;
pub mod transport;

pub use error::{ErrorKind, Result, SnagError};
