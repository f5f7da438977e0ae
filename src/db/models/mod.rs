//! Database models split into separate files.
//! This module re-exports individual model modules so imports like
//! `use crate::db::models::*;` work.

pub mod item;
pub mod list;
pub mod membership;
pub mod session;
pub mod share_link;
pub mod user;

pub use self::item::*;
pub use self::list::*;
pub use self::membership::*;
pub use self::session::*;
pub use self::share_link::*;
pub use self::user::*;
