//! Server-side page sources.
//!
//! A [`PageSource`] is the other end of the fetch boundary: it receives the
//! request parameters the query layer built and answers with one page. The
//! crate ships [`MemorySource`], which keeps its rows in memory and is what
//! the CLI and the integration tests serve from.
//!
//! # Modules
//!
//! - [`backend`]: the [`PageSource`] trait
//! - [`request`]: parsing request parameters back into a [`PageQuery`]
//! - [`memory`]: in-memory rows with search, filtering, sorting and paging

pub mod backend;
pub mod memory;
pub mod request;

pub use backend::PageSource;
pub use memory::MemorySource;
pub use request::{Clause, PageQuery};
