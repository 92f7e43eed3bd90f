//! SharePoint REST module
//!
//! Provides the authenticated [`ClientContext`] handle for a site.

pub mod client;
pub mod types;

pub use client::{ClientContext, ContextBuilder};
pub use types::{File, Folder, Web};
