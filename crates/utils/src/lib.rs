//! `utils` crate — small helpers with no dependency on the pipeline.

pub mod greetings;

pub use greetings::greet;
