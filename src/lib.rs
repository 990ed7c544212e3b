//! headlines: a terminal client for paginated, categorized, searchable
//! news headlines.
//!
//! The crate is built around [`controller::FeedController`], an event-driven
//! state machine that coordinates category, query, and page state against a
//! NewsAPI-style remote service. [`client::ApiClient`] performs the HTTP
//! work, [`config::Config`] supplies explicit configuration (including the
//! API key), and [`ui`] is a thin line-oriented shell over the controller.

pub mod client;
pub mod config;
pub mod controller;
pub mod ui;
