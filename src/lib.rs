//! replbox - the project store behind an in-browser component playground.
//!
//! The store keeps a set of source files, compiles the one being edited as it
//! changes, maintains the `import-map.json` the sandbox resolves modules
//! with, switches compiler versions, and packs the whole project into a
//! shareable token.
//!
//! ```ignore
//! let store = ReplStore::new(Arc::new(MyCompiler), StoreOptions::default());
//! store.init().await;
//! store.update_file("App.vue", "<template><h1>Hi</h1></template>");
//! let token = store.serialize()?;
//! ```

pub mod codec;
pub mod compiler;
pub mod config;
pub mod error;
pub mod file;
pub mod import_map;
pub mod logger;
pub mod serializer;
pub mod store;

pub use compiler::{CompilerResolver, SfcCompiler, VersionRequest};
pub use config::StoreConfig;
pub use error::{CompileError, DecodeError, ParseError, ResolveError};
pub use file::{CompiledOutput, File, FileSnapshot};
pub use store::{ReplStore, StoreEvent, StoreOptions};
