//! PoseKit CLI library.
//!
//! This crate provides the pieces behind the `posekit` binary: user
//! configuration, the on-disk pose catalog, JSON scene files standing in for
//! a live rig, and the command implementations.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod scene;
