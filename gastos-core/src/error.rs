use thiserror::Error;

use crate::columns::Role;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GastosError {
    /// The mandatory description column could not be resolved.
    #[error("no description column found (expected one of: {expected}); headers were: {found}")]
    Schema { expected: String, found: String },

    /// Export needs date and amount; at least one of them was not resolved.
    #[error("cannot export: missing {} column", join_roles(.missing))]
    MissingColumn { missing: Vec<Role> },

    #[error("invalid configuration: {0}")]
    Config(String),
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.name())
        .collect::<Vec<_>>()
        .join(" and ")
}

pub type Result<T> = std::result::Result<T, GastosError>;
