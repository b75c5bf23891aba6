use anyhow::Context;
use axum::Router;
use clap::{Args, Parser, Subcommand};
use script_loader::{
    DirEmitter, LoaderOptions, OutputBundle, Plugin, ScriptLoaderPlugin, ServerConfig,
    configure_dev_server, run_generate_bundle,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "script-loader", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Emit the loader script for a build manifest.
    Build(BuildArgs),
    /// Serve a directory with the dev loader route in front.
    Dev(DevArgs),
}

#[derive(Debug, Args)]
struct LoaderArgs {
    /// TOML file with loader options.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base name of the emitted loader.
    #[arg(long)]
    file_name: Option<String>,
    /// Emit `{file-name}.js` instead of a content-hashed name.
    #[arg(long)]
    no_hash: bool,
    /// Prefix prepended to every output file name.
    #[arg(long)]
    external_src: Option<String>,
    /// Set `crossorigin` on entry scripts to this value.
    #[arg(long)]
    crossorigin: Option<String>,
}

impl LoaderArgs {
    fn resolve(&self, fallback: Option<&PathBuf>) -> anyhow::Result<LoaderOptions> {
        let mut options = match self.config.as_ref().or(fallback) {
            Some(path) => LoaderOptions::from_path(path)?,
            None => LoaderOptions::default(),
        };
        if let Some(name) = &self.file_name {
            options.file_name = name.clone();
        }
        if self.no_hash {
            options.should_hash = false;
        }
        if let Some(prefix) = &self.external_src {
            options.external_src = Some(prefix.clone());
        }
        if let Some(value) = &self.crossorigin {
            options.crossorigin = true;
            options.crossorigin_val = value.clone();
        }
        Ok(options)
    }
}

#[derive(Debug, Args)]
struct BuildArgs {
    /// JSON output manifest produced by the bundler.
    #[arg(long)]
    manifest: PathBuf,
    #[arg(long, default_value = "dist")]
    out_dir: PathBuf,
    #[command(flatten)]
    loader: LoaderArgs,
}

#[derive(Debug, Args)]
struct DevArgs {
    /// Directory served for every other path.
    #[arg(long)]
    root: Option<PathBuf>,
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Unbundled entry module, relative to the loader's base path.
    #[arg(long)]
    entry: Option<String>,
    #[command(flatten)]
    loader: LoaderArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => build(args).await,
        Command::Dev(args) => dev(args).await,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

async fn build(args: BuildArgs) -> anyhow::Result<()> {
    let options = args.loader.resolve(None)?;
    let bundle = OutputBundle::from_path(&args.manifest)?;
    tracing::info!(outputs = bundle.len(), out_dir = %args.out_dir.display(), "running bundle hooks");

    let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(ScriptLoaderPlugin::new(options))];
    let mut emitter = DirEmitter::new(&args.out_dir);
    run_generate_bundle(&plugins, &bundle, &mut emitter)?;
    for name in emitter.written() {
        println!("{}", emitter.out_dir().join(name).display());
    }
    Ok(())
}

async fn dev(args: DevArgs) -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;
    let mut options = args.loader.resolve(config.loader_config.as_ref())?;
    if let Some(entry) = args.entry {
        options.dev_entry = entry;
    }
    let root = args.root.unwrap_or(config.root);
    let addr = args.bind.unwrap_or(config.bind_addr);

    let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(ScriptLoaderPlugin::new(options))];
    let router = Router::new().fallback_service(ServeDir::new(&root));
    let app = configure_dev_server(&plugins, router).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, root = %root.display(), "starting dev server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
