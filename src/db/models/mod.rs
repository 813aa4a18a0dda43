#![allow(unused_imports)]

//! Database models split into separate files, re-exported here so
//! `use crate::db::models::*;` keeps working across call sites.

pub mod periodic_notification;
pub mod scheduled_notification;
pub mod subscriber;
pub mod template;

pub use self::periodic_notification::*;
pub use self::scheduled_notification::*;
pub use self::subscriber::*;
pub use self::template::*;
