use anyhow::Result;
use colored::Colorize;
use folio::Project;
use std::path::Path;

use super::print_build_failure;

pub fn execute(root: &Path) -> Result<()> {
    println!("{}", "Building routes...".green().bold());
    println!();

    let project = Project::open(root)?;
    println!("Pages: {}", project.pages_dir().display().to_string().cyan());

    match project.build() {
        Ok(report) => {
            println!(
                "{} {} pages, {} routes in {:?}",
                "✓".green(),
                report.pages,
                report.routes,
                report.elapsed
            );
            println!("Store: {}", report.store_path.display().to_string().cyan());
            Ok(())
        }
        Err(err) => {
            print_build_failure(&err);
            Err(anyhow::anyhow!("build failed, route store left unchanged"))
        }
    }
}
