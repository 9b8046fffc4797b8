//! State module for tracking crawl progress
//!
//! A crawl run is a small state machine driven by the coordinator. Every
//! transition is checked against [`CrawlState::can_transition_to`].

mod crawl_state;

pub use crawl_state::{CrawlState, StopReason};
