pub mod config;
pub mod error;

pub use config::{load_secrets, Credentials};
pub use error::*;
