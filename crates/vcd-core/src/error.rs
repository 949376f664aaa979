use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("provisioning state has no value for '{key}'")]
    MissingState { key: String },

    #[error("provisioning state value '{key}' is a {found}, expected {expected}")]
    UnexpectedStateValue {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}
