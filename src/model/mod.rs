pub mod action;
pub mod event;
pub mod quiz;
pub mod types;
