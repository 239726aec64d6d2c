//! Space Weather Stories — the logic core of a children's space-weather
//! learning experience.
//!
//! Branching stories with scored choices and quiz / mini-game gates,
//! parameter-driven canvas simulations running on an explicit frame loop,
//! particle mini-games, and one-way achievements. Presentation, audio
//! synthesis and routing live outside this crate and talk to it through
//! snapshots, notifications and sound cues.

pub mod core;
pub mod schema;
