//! Cloud Foundry V3 resource types.

mod app;
mod build;
mod common;
mod job;
mod organization;
mod package;
mod space;

pub use app::*;
pub use build::*;
pub use common::*;
pub use job::*;
pub use organization::*;
pub use package::*;
pub use space::*;
