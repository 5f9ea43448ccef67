use anyhow::Result;
use colored::Colorize;
use folio::Dispatch;
use std::path::Path;

use super::open_table;

pub fn execute(root: &Path, path: &str, method: &str) -> Result<()> {
    let table = open_table(root)?;

    match table.dispatch(path, method) {
        Dispatch::Found(route) => {
            println!("{} {} {}", "200".green().bold(), route.method.cyan(), route.handler);

            let mut params: Vec<_> = route.params.iter().collect();
            params.sort();
            for (name, value) in params {
                println!("  {} = {}", name.yellow(), value);
            }
            for middleware in &route.middlewares {
                println!("  {} {}", "middleware".dimmed(), middleware.class);
            }
        }
        Dispatch::MethodNotAllowed { allowed } => {
            println!("{} method not allowed (allowed: {})", "405".yellow().bold(), allowed.join(", "));
        }
        Dispatch::NotFound => {
            println!("{} not found", "404".red().bold());
        }
    }

    Ok(())
}
