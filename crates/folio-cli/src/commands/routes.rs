use anyhow::Result;
use colored::Colorize;
use folio_router::store;
use std::path::Path;

use super::open_table;

pub fn execute(root: &Path, json: bool) -> Result<()> {
    let table = open_table(root)?;
    let trie = table.snapshot();

    if json {
        println!("{}", store::to_json(&trie)?);
        return Ok(());
    }

    let routes = trie.routes();
    if routes.is_empty() {
        println!("{}", "No routes".yellow());
        return Ok(());
    }

    let width = routes.iter().map(|r| r.pattern.len()).max().unwrap_or(0);
    println!("{:<7} {:<width$} {}", "METHOD".bold(), "PATTERN".bold(), "HANDLER".bold());
    for route in &routes {
        println!(
            "{:<7} {:<width$} {}",
            route.method.cyan(),
            route.pattern,
            route.handler.dimmed()
        );
    }
    println!();
    println!("{} routes, {} handlers", routes.len(), trie.handlers().len());

    Ok(())
}
