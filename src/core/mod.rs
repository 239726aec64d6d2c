pub mod achievements;
pub mod animation;
pub mod catalog;
pub mod cue;
pub mod games;
pub mod lab;
pub mod notify;
pub mod parameters;
pub mod particles;
pub mod profile;
pub mod render;
pub mod session;
pub mod task;
pub mod template;
