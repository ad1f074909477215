pub mod api;
pub mod config;
pub mod display;
pub mod driver;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod frames;
pub mod pose;
pub mod profile;
pub mod report;
pub mod scoring;
pub mod session;
pub mod state;
pub mod tracker;
