//! chatcmd shell
//!
//! A stand-in host for the dispatcher: simulated players, the `teleport`
//! command family and a stdin chat loop.

pub mod shell;
pub mod teleport;
pub mod world;
