use thiserror::Error;

#[derive(Error, Debug)]
pub enum QualityError {
    #[error("KPI table is missing required metric columns: {0:?}")]
    MissingColumns(Vec<String>),
}
