//! SQL for the `pipeline_runs` table, one function per statement.
//!
//! Functions take a `&mut PgConnection` and know nothing about the
//! provider's JSON.

pub mod pipeline_runs;
