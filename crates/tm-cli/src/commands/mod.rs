//! CLI command implementations

pub(crate) mod common;
pub(crate) mod inspect;
pub(crate) mod migrate;
pub(crate) mod plans;
pub(crate) mod status;
pub(crate) mod verify;
