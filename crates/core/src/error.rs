use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimwatchError {
    #[error("Invalid configuration: {0}")]
    Config(String),
}
