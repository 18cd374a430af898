pub mod cache;
pub mod config;
pub mod dataset;
pub mod demo;
pub mod event;
pub mod export;
pub mod ingest;
pub mod match_stats;
pub mod percentile;
pub mod pitch;
pub mod rankings;
pub mod state;
pub mod teams;
pub mod value;
