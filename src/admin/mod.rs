//! Admin surface: account/product oversight, dashboard statistics, and
//! bank account records.

pub mod handlers;
pub mod stats;
