use crate::config::LoaderOptions;
use crate::dev::DevLoader;
use crate::hash::asset_file_name;
use crate::loader::generate_loading_script;
use crate::manifest::OutputBundle;
use axum::Router;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("file {0:?} was already emitted")]
    Duplicate(String),
    #[error("file {0:?} would replace an existing bundle output")]
    ConflictsWithBundle(String),
    #[error("writing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin {plugin} failed to emit: {source}")]
    Emit {
        plugin: String,
        #[source]
        source: EmitError,
    },
}

/// An extra output handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    pub file_name: String,
    pub source: String,
}

/// Host capability for adding outputs during bundle generation.
pub trait AssetEmitter {
    fn emit_file(&mut self, asset: EmittedAsset) -> Result<(), EmitError>;
}

/// Keeps emitted assets in memory.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    assets: Vec<EmittedAsset>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assets(&self) -> &[EmittedAsset] {
        &self.assets
    }

    pub fn into_assets(self) -> Vec<EmittedAsset> {
        self.assets
    }
}

impl AssetEmitter for MemoryEmitter {
    fn emit_file(&mut self, asset: EmittedAsset) -> Result<(), EmitError> {
        if self.assets.iter().any(|a| a.file_name == asset.file_name) {
            return Err(EmitError::Duplicate(asset.file_name));
        }
        self.assets.push(asset);
        Ok(())
    }
}

/// Writes emitted assets below an output directory.
#[derive(Debug)]
pub struct DirEmitter {
    out_dir: PathBuf,
    written: IndexSet<String>,
}

impl DirEmitter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            written: IndexSet::new(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Emitted file names in emission order.
    pub fn written(&self) -> impl Iterator<Item = &str> {
        self.written.iter().map(String::as_str)
    }
}

impl AssetEmitter for DirEmitter {
    fn emit_file(&mut self, asset: EmittedAsset) -> Result<(), EmitError> {
        if self.written.contains(&asset.file_name) {
            return Err(EmitError::Duplicate(asset.file_name));
        }
        let path = self.out_dir.join(&asset.file_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| EmitError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, asset.source.as_bytes())
            .map_err(|source| EmitError::Io { path: path.clone(), source })?;
        debug!(path = %path.display(), bytes = asset.source.len(), "wrote asset");
        self.written.insert(asset.file_name);
        Ok(())
    }
}

/// Rejects emits that would shadow an output already in the bundle.
struct BundleGuard<'a> {
    bundle: &'a OutputBundle,
    inner: &'a mut dyn AssetEmitter,
}

impl AssetEmitter for BundleGuard<'_> {
    fn emit_file(&mut self, asset: EmittedAsset) -> Result<(), EmitError> {
        if self
            .bundle
            .iter()
            .any(|(_, entry)| entry.file_name() == asset.file_name)
        {
            return Err(EmitError::ConflictsWithBundle(asset.file_name));
        }
        self.inner.emit_file(asset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Build,
    Serve,
}

/// Lifecycle hooks a host invokes on each registered plugin.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Restricts the plugin to one mode; `None` applies it to both.
    fn apply(&self) -> Option<Mode> {
        None
    }

    /// Called once per build after every output is final.
    fn generate_bundle(
        &self,
        _bundle: &OutputBundle,
        _emitter: &mut dyn AssetEmitter,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called once when the dev server starts; returns the router to serve.
    fn configure_server(&self, router: Router) -> Router {
        router
    }
}

fn applies(plugin: &dyn Plugin, mode: Mode) -> bool {
    plugin.apply().is_none_or(|m| m == mode)
}

/// Runs every build-mode plugin's bundle hook in registration order.
pub fn run_generate_bundle(
    plugins: &[Box<dyn Plugin>],
    bundle: &OutputBundle,
    emitter: &mut dyn AssetEmitter,
) -> Result<(), PluginError> {
    for plugin in plugins {
        if !applies(&**plugin, Mode::Build) {
            continue;
        }
        debug!(plugin = plugin.name(), "generate_bundle");
        let mut guard = BundleGuard {
            bundle,
            inner: &mut *emitter,
        };
        plugin.generate_bundle(bundle, &mut guard)?;
    }
    Ok(())
}

/// Lets every serve-mode plugin wrap the dev server router.
pub fn configure_dev_server(plugins: &[Box<dyn Plugin>], router: Router) -> Router {
    let mut router = router;
    for plugin in plugins {
        if applies(&**plugin, Mode::Serve) {
            debug!(plugin = plugin.name(), "configure_server");
            router = plugin.configure_server(router);
        }
    }
    router
}

/// Emits the runtime loader for a build and serves its dev counterpart.
#[derive(Debug, Clone, Default)]
pub struct ScriptLoaderPlugin {
    options: LoaderOptions,
}

impl ScriptLoaderPlugin {
    pub const NAME: &'static str = "script-loader";

    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Generated loader source and the file name it is emitted under.
    pub fn render(&self, bundle: &OutputBundle) -> EmittedAsset {
        let source = generate_loading_script(bundle, &self.options.script_options());
        let file_name = asset_file_name(&self.options.file_name, &source, self.options.should_hash);
        EmittedAsset { file_name, source }
    }
}

impl Plugin for ScriptLoaderPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate_bundle(
        &self,
        bundle: &OutputBundle,
        emitter: &mut dyn AssetEmitter,
    ) -> Result<(), PluginError> {
        let asset = self.render(bundle);
        let file_name = asset.file_name.clone();
        emitter.emit_file(asset).map_err(|source| PluginError::Emit {
            plugin: Self::NAME.to_string(),
            source,
        })?;
        info!(file = %file_name, outputs = bundle.len(), "emitted loader script");
        Ok(())
    }

    fn configure_server(&self, router: Router) -> Router {
        let loader = DevLoader::from_options(&self.options);
        info!(path = loader.path(), entry = %self.options.dev_entry, "dev loader route installed");
        loader.layer(router)
    }
}
