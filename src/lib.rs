//! Emits a runtime loader script for a finished build and serves an
//! unbundled equivalent from the dev server.
//!
//! The loader finds its own `<script>` tag, derives a base path from its
//! `src`, and appends `<script type="module">`, `<link rel="modulepreload">`
//! and `<link rel="stylesheet">` nodes for the build's outputs.

pub mod config;
pub mod dev;
pub mod hash;
pub mod loader;
pub mod manifest;
pub mod plugin;

pub use config::{LoaderOptions, ServerConfig};
pub use dev::DevLoader;
pub use manifest::{OutputBundle, OutputEntry};
pub use plugin::{
    AssetEmitter, DirEmitter, EmittedAsset, MemoryEmitter, Mode, Plugin, ScriptLoaderPlugin,
    configure_dev_server, run_generate_bundle,
};
