use anyhow::Result;
use colored::Colorize;
use folio::{Config, Project};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::commands::print_build_failure;

/// Rebuilds the route store when pages or `folio.toml` change
pub struct PageWatcher {
    root: PathBuf,
}

impl PageWatcher {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Watches until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let config = Config::load_from_root(&self.root)?;
        let output_dir = self.root.join(&config.build.output_dir);
        let debounce = Duration::from_millis(config.dev.debounce_ms);

        let (tx, mut rx) = mpsc::channel::<PathBuf>(100);

        let ignored_dir = output_dir.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let Ok(event) = res else { return };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths {
                if !is_ignored(&path, &ignored_dir) {
                    let _ = tx.blocking_send(path);
                }
            }
        })?;

        let mut watch_paths: Vec<PathBuf> = config
            .dev
            .watch_paths
            .iter()
            .map(|p| self.root.join(p))
            .collect();
        watch_paths.push(self.root.join(&config.routing.pages_dir));
        watch_paths.sort();
        watch_paths.dedup();

        for path in &watch_paths {
            if path.exists() {
                watcher.watch(path, RecursiveMode::Recursive)?;
                println!("  {} Watching: {}", "👀".cyan(), path.display());
            }
        }
        let config_file = self.root.join(folio::config::CONFIG_FILE);
        if config_file.exists() {
            watcher.watch(&config_file, RecursiveMode::NonRecursive)?;
        }
        println!();

        loop {
            tokio::select! {
                changed = rx.recv() => {
                    let Some(path) = changed else { break };

                    // let a burst of editor writes settle
                    tokio::time::sleep(debounce).await;
                    let mut batched = 1;
                    while rx.try_recv().is_ok() {
                        batched += 1;
                    }
                    debug!(changes = batched, "rebuilding routes");

                    println!("{} Changed: {}", "🔄".yellow(), path.display());
                    self.rebuild();
                }
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    println!("{}", "Stopped watching".dimmed());
                    break;
                }
            }
        }

        Ok(())
    }

    fn rebuild(&self) {
        let result = Project::open(&self.root).and_then(|project| project.build());
        match result {
            Ok(report) => println!(
                "{} {} routes rebuilt in {:?}",
                "✓".green(),
                report.routes,
                report.elapsed
            ),
            Err(err) => print_build_failure(&err),
        }
    }
}

/// Hidden files and the build output never trigger a rebuild
fn is_ignored(path: &Path, output_dir: &Path) -> bool {
    if path.starts_with(output_dir) {
        return true;
    }
    path.components().any(|component| match component {
        Component::Normal(name) => name.to_str().is_some_and(|n| n.starts_with('.')),
        _ => false,
    })
}
