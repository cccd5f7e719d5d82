use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data load error: {0}")]
    DataLoad(String),
    #[error("Empty input: {0}")]
    EmptyInput(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Unexpected record layout: expected at least {expected} columns, found {found}")]
    Schema { expected: usize, found: usize },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
