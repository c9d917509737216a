use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Missing input file: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("{} is missing required columns: {columns:?}", .path.display())]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("Output path has no file name: {}", .0.display())]
    InvalidOutputPath(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
