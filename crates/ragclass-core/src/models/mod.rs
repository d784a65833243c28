//! Domain models shared across the API modules and consumers.

pub mod class;
pub mod user;

pub use class::{ClassDetail, ClassMember, ClassSummary};
pub use user::{CurrentUser, UserProfile};
