//! cladesim - Birth-Death Phylogeny Simulator

pub mod config;
pub mod core;
pub mod random;
pub mod sim;
