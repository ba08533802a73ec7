// gSENSOR - Coordination core
//
// Everything that does not touch hardware lives here so it can be exercised
// on the host: filtering, gesture recognition, the UI state machine, the
// output scheduler and the wire formats. The firmware binary supplies the
// `board` trait implementations.

pub mod board;
pub mod commands;
pub mod config;
pub mod console;
pub mod events;
pub mod filter;
pub mod flags;
pub mod gesture;
pub mod input;
pub mod render;
pub mod scheduler;
pub mod telemetry;
pub mod ui;
