//! Domain operations. Each function takes the store handle and runs to
//! completion synchronously; handlers call them through
//! [`crate::blocking`].

pub mod connections;
pub mod directory;
pub mod matching;
pub mod messages;
pub mod opportunities;
pub mod posts;
pub mod users;
