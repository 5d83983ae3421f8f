//! Application layer coordinating the table layers.
//!
//! # Architecture
//!
//! Data flows one way:
//!
//! ```text
//! UI / history / timer → TableEvent → handle_event → store setters
//!                                           │
//!                 ┌─────────────────────────┼──────────────────────┐
//!                 ▼                         ▼                      ▼
//!          QueryManager::observe     UrlSync::stage         render flag
//!                 │                         │
//!          Action::Fetch             History write (on Tick)
//!                 │
//!          TableEvent::FetchCompleted (back into handle_event)
//! ```
//!
//! # Modules
//!
//! - [`actions`]: side effects for the runtime
//! - [`controller`]: one mounted table
//! - [`handler`]: event processing

pub mod actions;
pub mod controller;
pub mod handler;

pub use actions::Action;
pub use controller::TableController;
pub use handler::{handle_event, TableEvent};
