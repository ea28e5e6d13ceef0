pub mod alert;
pub mod config;
pub mod error;
pub mod point;

pub use alert::*;
pub use config::Config;
pub use error::*;
pub use point::*;
