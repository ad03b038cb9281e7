//! Tesselc - sessions and clusters for the Tessel execution tree.
//!
//! The driver layer on top of `tessel_eval`:
//!
//! - `SessionConfig`: locality placement and evaluation knobs, from code or
//!   the environment
//! - `Session`: compiles expression trees against persistent globals and
//!   runs them
//! - `LocalityCluster`: every locality of a cluster in one process
//!
//! Enable logging with `RUST_LOG=tesselc=debug,tessel_eval=debug` after
//! calling [`init_tracing`].

use std::sync::Once;

mod cluster;
pub mod config;
mod error;
mod session;

pub use cluster::LocalityCluster;
pub use config::SessionConfig;
pub use error::{ConfigError, Error};
pub use session::{Session, SessionBuilder};

pub use tessel_eval::CompiledFunction;
pub use tessel_ir::Expr;
pub use tessel_patterns::{EvalError, EvalErrorKind, EvalMode, Value};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
