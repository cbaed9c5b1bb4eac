pub mod config;
pub mod logging;

pub mod archive;
pub mod control;
pub mod downloader;
pub mod model;
pub mod report;
pub mod scheduler;
