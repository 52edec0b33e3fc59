pub mod config;
pub mod detector;
pub mod duration;
pub mod feeds;
pub mod fetch;
pub mod geo;
pub mod matching;
pub mod pipeline;
pub mod sink;
pub mod siri;
pub mod ticket;
