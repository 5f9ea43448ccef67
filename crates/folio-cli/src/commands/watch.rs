use anyhow::Result;
use colored::Colorize;
use std::path::Path;

#[cfg(feature = "watch")]
pub fn execute(root: &Path) -> Result<()> {
    use crate::watcher::PageWatcher;

    println!("{}", "Watching pages...".green().bold());
    println!();

    // initial build; failures are reported and watching continues
    if let Err(err) = super::build::execute(root) {
        eprintln!("{} {}", "⚠".yellow(), err);
    }
    println!();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { PageWatcher::new(root.to_path_buf()).run().await })
}

#[cfg(not(feature = "watch"))]
pub fn execute(_root: &Path) -> Result<()> {
    println!("{}", "⚠ Watch mode not available".yellow());
    println!();
    println!("Watch mode requires the 'watch' feature.");
    println!("Rebuild with: cargo build --features watch");
    Ok(())
}
