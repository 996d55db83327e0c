//! Client implementations.

pub mod cli;
