#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Replay harness for the Circles of Hell rules engine.
//!
//! Loads a game snapshot, feeds a scripted sequence of pointer events and
//! server answers through the action controller, and reports every request
//! and render directive it emits.

pub mod network;
pub mod replay;
pub mod script;

pub use network::{NetworkClient, ScriptedNetwork};
pub use replay::{Replay, ReplayEvent, SummaryBackend};
pub use script::{Script, Step};
