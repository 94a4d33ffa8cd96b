//! wyper: the data layer of an offline-first blog.
//!
//! Posts and chat messages come from a remote REST API when it answers and
//! from a [`store::LocalStore`] when it does not.

pub mod api;
pub mod cli;
pub mod frontmatter;
pub mod models;
pub mod seed;
pub mod services;
pub mod settings;
pub mod storage;
pub mod store;
