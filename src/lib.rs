//! apiview: poll a set of JSON endpoints and show each one as an HTML table
//! in its own dashboard tab.
//!
//! Pipeline: [`registry`] (endpoint templates + parameters) → [`poller`]
//! (one fetch per endpoint) → [`format`] (JSON → HTML table) → render
//! channel → [`web`] (tabbed display). [`session`] owns the timer and the
//! channels.

pub mod activity;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod poller;
pub mod registry;
pub mod session;
pub mod web;
