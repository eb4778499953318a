//! Render Python and R plotting code into charts.
//!
//! The [`client`] submits code to a visualization service over
//! `POST /api/visualize`; the [`server`] module is that service, running each
//! submission through the [`execution`] engine. [`workbench`] and
//! [`templates`] hold the editing state a front end keeps around a submission.

pub mod cli;
pub mod client;
pub mod config;
pub mod execution;
pub mod language;
pub mod printer;
pub mod protocol;
pub mod server;
pub mod templates;
pub mod workbench;

pub use client::{Visualization, VisualizeClient, VisualizeError};
pub use language::Language;
pub use workbench::Workbench;
