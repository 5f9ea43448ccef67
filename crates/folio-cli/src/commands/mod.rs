pub mod build;
pub mod match_route;
pub mod routes;
pub mod url;
pub mod watch;

use anyhow::Result;
use colored::Colorize;
use folio::{Project, RouteTable};
use folio_router::BuildErrors;
use std::path::Path;

/// Opens the project and its built route table
pub fn open_table(root: &Path) -> Result<RouteTable> {
    let project = Project::open(root)?;
    let store = project.store();
    if !store.exists() {
        anyhow::bail!(
            "No route store at {:?}. Run `folio build` first.",
            store.path()
        );
    }
    RouteTable::open(store)
}

/// Prints a failed build, one line per page when the error carries them
pub fn print_build_failure(err: &anyhow::Error) {
    match err.downcast_ref::<BuildErrors>() {
        Some(errors) => {
            eprintln!("{} {} page(s) failed to build", "✗".red(), errors.len());
            for error in errors.errors() {
                eprintln!("  {} {}", "-".red(), error);
            }
        }
        None => eprintln!("{} {:#}", "✗".red(), err),
    }
}
