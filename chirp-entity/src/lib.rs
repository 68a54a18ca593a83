//! Database entities: users, their tweets, and the two edge tables
//! (`follows`, `likes`) connecting them.

pub mod prelude;

pub mod follow;
pub mod like;
pub mod tweet;
pub mod user;
