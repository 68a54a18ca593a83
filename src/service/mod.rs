//! Domain operations over an injected database handle.
//!
//! Each service is a thin borrowed view over anything that implements
//! [`ConnectionTrait`](sea_orm::ConnectionTrait), so the same code runs on a
//! pooled connection or inside a transaction.

mod account;
mod content;
mod graph;
mod reaction;

pub use account::*;
pub use content::*;
pub use graph::*;
pub use reaction::*;

use sea_orm::TryInsertResult;

/// Outcome of an `INSERT .. ON CONFLICT DO NOTHING` on an edge table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeInsert {
    Inserted,
    AlreadyExists,
}

impl<T> From<TryInsertResult<T>> for EdgeInsert {
    fn from(res: TryInsertResult<T>) -> Self {
        match res {
            TryInsertResult::Inserted(_) => Self::Inserted,
            TryInsertResult::Conflicted | TryInsertResult::Empty => Self::AlreadyExists,
        }
    }
}
