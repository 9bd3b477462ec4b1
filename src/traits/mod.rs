//! Trait definitions for resource operations.
//!
//! Each resource type implements the traits it supports, so callers use the
//! same `App::get` / `Space::list_all` shape for every collection.

mod delete;
mod get;
mod list;
mod update;

pub use delete::Delete;
pub use get::Get;
pub use list::List;
pub use update::Update;
