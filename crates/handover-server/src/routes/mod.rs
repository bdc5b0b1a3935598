pub mod config;
pub mod events;
pub mod flags;
pub mod orchestrations;
pub mod secondary;
pub mod turns;
