use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid resource type reference '{0}': expected provider.group.name")]
    InvalidDefRef(String),
}
