// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod export;
pub mod logging;
pub mod pages;
pub mod persona;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile};
use crate::engine::{
    CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, Scheduler, SessionConfig, SessionNotice,
};
use crate::exec::{CollaboratorBackend, GeminiClient};
use crate::export::{DirectoryExporter, Exporter};
use crate::types::{PersonaReference, PersonaRole, StyleContext};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and persona upload
/// - the optional hero analysis
/// - core / runtime / generation backend
/// - the reader console (interactive) or the whole-book batch run
/// - Ctrl-C handling
/// - export of the completed pages
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| cfg.session.output_dir.clone());

    if args.dry_run {
        print_dry_run(&cfg, &output_dir);
        return Ok(());
    }

    let cast = persona::load_cast(&cfg, &config_root_dir(&config_path))?;
    let client = Arc::new(GeminiClient::from_env(
        &cfg.render,
        cfg.session.request_timeout,
    )?);

    let analysed_style = analyse_hero(&mut cfg, &client, &cast).await;
    let style = StyleContext::resolve(
        cfg.render.style.as_deref(),
        analysed_style.as_deref(),
        &cfg.story.genre,
    );
    info!(%style, premise = cfg.story.premise_or_default(), "story context resolved");

    let options = RuntimeOptions {
        exit_when_idle: !args.interactive,
    };
    let session = SessionConfig::from_config(&cfg, cast, style, options);
    let core = CoreRuntime::new(session);
    let max_sheet = core.scheduler().max_sheet();

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let backend = CollaboratorBackend::new(
        client.clone(),
        client.clone(),
        client,
        rt_tx.clone(),
        cfg.session.request_timeout,
    );

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let (notice_tx, notice_rx) = mpsc::channel::<SessionNotice>(64);
    let printer = tokio::spawn(print_notices(notice_rx));

    if args.interactive {
        console::spawn_console(rt_tx.clone(), max_sheet)?;
    } else {
        // Whole book: launch, then jump straight to the back cover.
        rt_tx.send(RuntimeEvent::Launch).await?;
        rt_tx
            .send(RuntimeEvent::ViewportChanged { sheet: max_sheet })
            .await?;
    }

    let runtime = Runtime::new(core, rt_rx, backend).with_notices(notice_tx);
    let core = runtime.run().await?;
    if let Err(e) = printer.await {
        debug!(error = %e, "notice printer ended abnormally");
    }

    export_pages(&core, &output_dir, &cfg.story.title)
}

/// Ask the vision model about the hero reference and fill whatever the
/// config left open. Returns the analysed style, if any.
///
/// Failure is logged and ignored.
async fn analyse_hero(
    cfg: &mut ConfigFile,
    client: &GeminiClient,
    cast: &[Arc<PersonaReference>],
) -> Option<String> {
    if !cfg.render.analyze_hero {
        return None;
    }
    let hero = cast.iter().find(|p| p.role == PersonaRole::Hero)?;
    if cfg.story.premise.is_some() && cfg.render.style.is_some() {
        debug!("premise and style both configured; skipping hero analysis");
        return None;
    }

    match client.analyze_hero(hero, &cfg.story.genre).await {
        Ok(analysis) => {
            if cfg.story.premise.is_none() {
                cfg.story.premise = analysis.premise;
            }
            analysis.style
        }
        Err(e) => {
            warn!(error = %e, "hero analysis failed; continuing with configured values");
            None
        }
    }
}

async fn print_notices(mut rx: mpsc::Receiver<SessionNotice>) {
    while let Some(notice) = rx.recv().await {
        match notice {
            SessionNotice::Launched { pages } => println!("launched: {pages} pages"),
            SessionNotice::PageChanged { page, status } => println!("page {page:>2}: {status}"),
            SessionNotice::CredentialsRejected { page, message } => match page {
                Some(page) => println!("credentials rejected (page {page}): {message}"),
                None => println!("credentials rejected: {message}"),
            },
            SessionNotice::Idle => println!("idle"),
            SessionNotice::Reset => println!("session reset"),
        }
    }
}

fn export_pages(core: &CoreRuntime, output_dir: &Path, title: &str) -> Result<()> {
    let pages = core.store().completed_pages();
    if pages.is_empty() {
        info!("no completed pages; nothing to export");
        return Ok(());
    }

    let summary = DirectoryExporter::new(output_dir, title).export(&pages)?;
    println!(
        "exported {} of {} pages to {}",
        summary.files.len(),
        core.store().len(),
        output_dir.display()
    );
    Ok(())
}

/// Figure out where relative persona image paths are resolved from.
///
/// - If the config path has a non-empty parent (e.g. "comics/Inkflow.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Inkflow.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print the story settings and the page plan.
fn print_dry_run(cfg: &ConfigFile, output_dir: &Path) {
    let scheduler = Scheduler::new(cfg.story.story_pages, cfg.session.prefetch_story_pages);

    println!("inkflow dry-run");
    println!("  story.title = {}", cfg.story.title);
    println!("  story.genre = {} ({})", cfg.story.genre, cfg.story.tone);
    println!(
        "  story.language = {} ({})",
        cfg.story.language_code, cfg.story.language_name
    );
    println!("  story.premise = {}", cfg.story.premise_or_default());
    println!("  hero = {}", cfg.hero.name);
    if let Some(ref friend) = cfg.friend {
        println!("  friend = {}", friend.name);
    }
    println!(
        "  render.image_model = {}{}",
        cfg.render.image_model,
        if cfg.render.is_premium() { " (premium, credential probe at launch)" } else { "" }
    );
    println!("  session.request_timeout = {:?}", cfg.session.request_timeout);
    println!("  output = {}", output_dir.display());
    println!();

    println!(
        "pages ({}), prefetch up to page {}:",
        cfg.story.page_count(),
        scheduler.prefetch_bound()
    );
    for sheet in 0..=scheduler.max_sheet() {
        let first = if sheet == 0 { 0 } else { sheet * 2 - 1 };
        let last = scheduler.upper_bound(sheet);
        println!("  sheet {sheet}: pages {first}..={last}");
    }

    debug!("dry-run complete (no generation)");
}
