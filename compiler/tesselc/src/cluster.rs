//! In-process clusters.
//!
//! A [`LocalityCluster`] runs every locality of a cluster inside one
//! process: the sessions share a [`CollectiveHub`] for collectives and an
//! [`InProcessTransport`] for cross-locality calls. Useful for tests and for
//! hosts that want data-parallel evaluation without a network.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::debug;

use tessel_ir::Expr;
use tessel_patterns::{CollectiveHub, InProcessTransport, Value};

use crate::config::SessionConfig;
use crate::error::{ConfigError, Error};
use crate::session::{Session, SessionBuilder};

/// Every locality of a cluster, in one process.
pub struct LocalityCluster {
    sessions: Vec<Session>,
    hub: Arc<CollectiveHub>,
}

impl LocalityCluster {
    /// A cluster of `count` localities, each configured from `config`
    /// apart from its locality id.
    pub fn new(count: u32, config: &SessionConfig) -> Result<Self, Error> {
        if count == 0 {
            return Err(ConfigError::NoLocalities.into());
        }
        let participants = usize::try_from(count)
            .map_err(|e| Error::Runtime(format!("cluster too large: {e}")))?;
        let hub = Arc::new(CollectiveHub::new(participants));
        let transport = Arc::new(InProcessTransport::new());

        let sessions = (0..count)
            .map(|id| {
                let session = SessionBuilder::from_config(config.clone())
                    .locality(id, count)
                    .hub(Arc::clone(&hub))
                    .transport(transport.clone())
                    .build()?;
                transport.attach(session.locality());
                Ok(session)
            })
            .collect::<Result<Vec<_>, Error>>()?;
        debug!(localities = count, "cluster created");

        Ok(LocalityCluster { sessions, hub })
    }

    #[inline]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: u32) -> Option<&Session> {
        self.sessions.get(usize::try_from(id).ok()?)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[inline]
    pub fn hub(&self) -> &Arc<CollectiveHub> {
        &self.hub
    }

    /// Compile `exprs` on every locality and run them concurrently.
    ///
    /// Results are ordered by locality id. A locality that fails to compile
    /// does not take part, so collectives on the others time out.
    pub async fn run_everywhere(&self, exprs: &[Expr]) -> Vec<Result<Value, Error>> {
        self.run_on(exprs, |_| true).await
    }

    /// Like [`run_everywhere`](LocalityCluster::run_everywhere), but only on
    /// the localities `include` accepts. Results are ordered by locality id
    /// and cover the included localities only.
    pub async fn run_on(
        &self,
        exprs: &[Expr],
        include: impl Fn(u32) -> bool,
    ) -> Vec<Result<Value, Error>> {
        let pending: Vec<_> = self
            .sessions
            .iter()
            .filter(|session| include(session.locality().id()))
            .map(|session| {
                let compiled = session.compile(exprs);
                async move {
                    match compiled {
                        Ok(compiled) => compiled.run().await.map_err(Error::from),
                        Err(err) => Err(err),
                    }
                }
            })
            .collect();
        join_all(pending).await
    }

    /// Fail every pending collective.
    pub fn abort(&self) {
        self.hub.abort();
    }
}
