//! Shell parsing utilities for safety-gate
//!
//! Best-effort tokenization of free-text shell commands. There is no shell
//! grammar here: extraction can both miss and over-report paths.

pub mod shell;
