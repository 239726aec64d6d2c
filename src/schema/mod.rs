//! Static content types: stories, scenes, simulation parameters,
//! particles and achievements.

pub mod achievement;
pub mod parameter;
pub mod particle;
pub mod scene;
pub mod story;
