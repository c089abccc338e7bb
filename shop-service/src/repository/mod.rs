//! Query functions over a borrowed connection. Each one works the same on a
//! pooled connection and inside a transaction.

pub mod carts;
pub mod catalog;
pub mod orders;
pub mod users;
