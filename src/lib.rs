// src/lib.rs

pub mod ballot;
pub mod blockchain;
pub mod cli;
pub mod core;
