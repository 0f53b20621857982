use std::io;
use std::result;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

pub type Result<T> = result::Result<T, GenError>;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("cannot create more players than unique player ids ({requested} > {space})")]
    Capacity { requested: usize, space: usize },
    #[error("General {0:?}")]
    General(String),
    #[error("ArrowError: {0:?}")]
    Arrow(#[from] ArrowError),
    #[error("ParquetError: {0:?}")]
    Parquet(#[from] ParquetError),
    #[error("IoError: {0:?}")]
    Io(#[from] io::Error),
}
