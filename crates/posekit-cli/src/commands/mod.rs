//! CLI command implementations

pub mod apply;
pub mod catalog;
pub mod delete;
pub mod ghost;
pub mod mirror_name;
pub mod paste;
pub mod rules;
pub mod save;

mod reporting;
