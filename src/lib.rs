//! Sprig - retained-mode scene graph with positional audio
//!
//! The engine itself lives in `sprig_core` and `sprig_math`; this crate adds
//! layered configuration and the headless demo binary.

pub mod config;
