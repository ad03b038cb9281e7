//! Single-locality evaluation through `Session`.
//!
//! - `programs` - whole programs: recursion, closures, loops, list pipelines
//! - `errors` - compile and runtime failures as a host sees them

mod errors;
mod programs;
