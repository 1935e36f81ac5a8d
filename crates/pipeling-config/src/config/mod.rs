//! Configuration aggregation: multi-directory loading, imports, connection
//! derivation and the live snapshot.

mod aggregate;
mod derive;
mod import;
mod live;
mod loader;
mod options;
mod snapshot;

pub use aggregate::{load_config, LoadOutcome, Loader};
pub use import::{is_required_connection, plugin_kind, resolve_import, resolve_import_source};
pub use live::LiveConfig;
pub use options::{LoadOptions, DEFAULT_LOCK_FILE, DEFAULT_MAX_DECODE_PASSES};
pub use snapshot::ConfigurationSnapshot;
