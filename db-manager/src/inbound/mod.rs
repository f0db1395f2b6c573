//! Inbound adapters driving the repository.

pub mod cli;
