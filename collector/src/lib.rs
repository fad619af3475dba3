pub mod args;
pub mod cli;
pub mod config;
pub mod dns;
pub mod domain;
pub mod enrich;
mod error;
pub mod harvest;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod runner;
pub mod scan;
pub mod urls;

pub use config::Settings;
pub use domain::Domain;
pub use error::Error;
pub use runner::Runner;
