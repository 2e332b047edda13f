pub mod brief;
pub mod checkin;
pub mod common;
pub mod conditions;
pub mod config;
pub mod profile;
pub mod protocol;
