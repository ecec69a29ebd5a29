pub mod app;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod model;
pub mod persistence;
pub mod question_source;
pub mod scoring;
pub mod terminal;
pub mod timer;
pub mod view;
