//! Wiring of the registry used by a CLI run

use noticeboard_cache::{
    AllowAll, AuditSink, Authorizer, CallerContext, FileCache, FileStore, JsonlAuditSink, ReadOnly,
    SlotRegistry, TracingAuditSink,
};
use noticeboard_core::{RegistryConfig, Result, NOTICEBOARD_AUDIT_LOG_VAR};
use noticeboard_utils::XdgPaths;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

/// Options taken from the command line
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Root holding `store/` and `cache/`; XDG directories when unset
    pub data_dir: Option<PathBuf>,
    pub read_only: bool,
    pub principal: String,
}

/// Registry and caller identity shared by every command
#[derive(Debug)]
pub struct AppContext {
    pub registry: SlotRegistry,
    pub caller: CallerContext,
}

impl AppContext {
    /// Open the file-backed registry described by `options`
    ///
    /// Registry settings come from `NOTICEBOARD_*` environment variables.
    /// Audit events go to the JSON-lines file named by
    /// `NOTICEBOARD_AUDIT_LOG`, or to the log otherwise.
    pub fn open(options: ContextOptions) -> Result<Self> {
        let config = RegistryConfig::from_env()?;
        let (store_dir, cache_dir) = match &options.data_dir {
            Some(dir) => (dir.join("store"), dir.join("cache")),
            None => (XdgPaths::store_dir(), XdgPaths::shared_cache_dir()),
        };
        tracing::debug!(
            store = %store_dir.display(),
            cache = %cache_dir.display(),
            "opening notice registry"
        );

        let store = FileStore::open(store_dir)?;
        let cache = FileCache::open(cache_dir)?;
        let authorizer: Arc<dyn Authorizer> = if options.read_only {
            Arc::new(ReadOnly)
        } else {
            Arc::new(AllowAll)
        };
        let audit: Arc<dyn AuditSink> = match env::var_os(NOTICEBOARD_AUDIT_LOG_VAR) {
            Some(path) => Arc::new(JsonlAuditSink::new(PathBuf::from(path))),
            None => Arc::new(TracingAuditSink),
        };

        let registry = SlotRegistry::builder(Arc::new(store), Arc::new(cache))
            .config(config)
            .authorizer(authorizer)
            .audit(audit)
            .build()?;

        Ok(Self {
            registry,
            caller: CallerContext::cli(options.principal),
        })
    }
}
