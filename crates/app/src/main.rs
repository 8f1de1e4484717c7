use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use aikesif_application::{AppContext, SessionRequest, SessionWorker};
use aikesif_catalog::Catalog;
use aikesif_storage::{LocalAuth, Storage};
use aikesif_ui::Ui;
use anyhow::Context as _;
use directories::ProjectDirs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "AIKESIF_LOG";
const DB_ENV: &str = "AIKESIF_DB";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs =
        ProjectDirs::from("dev", "aikesif", "aikesif").context("resolve project dirs")?;

    let data_dir = project_dirs.data_dir();
    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;
    init_logging(&data_dir.join("aikesif.log"))?;

    let db_path = database_path(data_dir);
    info!(db = %db_path.display(), "starting");

    let storage = Storage::open(&db_path)?;
    let settings = storage.load_settings()?;
    if !settings.remember_session {
        storage.clear_auth_session()?;
    }

    let catalog = Catalog::bundled()?;
    info!(tools = catalog.len(), "catalog loaded");

    let auth = LocalAuth::new(Storage::open(&db_path)?, settings.password_min_len);
    let worker = SessionWorker::spawn(auth).context("spawn session worker")?;
    if !worker.send(SessionRequest::Restore) {
        warn!("session worker stopped before restore");
    }

    let ctx = AppContext::new(settings, catalog);
    let result = Ui::new(ctx, &worker).run();
    worker.shutdown();

    let ctx = result?;
    storage.save_settings(&ctx.settings)?;
    info!("bye");
    Ok(())
}

fn database_path(data_dir: &Path) -> PathBuf {
    match std::env::var_os(DB_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => data_dir.join("aikesif.db"),
    }
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("init logging: {err}"))
}
