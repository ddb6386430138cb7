// SPDX-License-Identifier: AGPL-3.0-or-later

//! Row types the store reads back: one `FromRow` struct per table whose rows are decoded
//! out of `sqlx` query results.
mod connection;
mod object;
mod update;

pub use connection::{ConnectionEntryRow, ConnectionRow};
pub use object::ObjectRow;
pub use update::UpdateRow;
