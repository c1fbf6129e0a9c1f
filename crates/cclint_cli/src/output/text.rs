//! Text output formatter

use std::path::Path;

use cclint_core::{LintResult, LintSummary, ProjectInfo};

pub fn output_text(summary: &LintSummary, root: &Path, quiet: bool) {
    for result in &summary.results {
        if !has_output(result, quiet) {
            continue;
        }

        let path = result.file.strip_prefix(root).unwrap_or(&result.file);
        println!("\n{}:", path.display());
        for message in &result.errors {
            println!("  error: {}", message);
        }
        for message in &result.warnings {
            println!("  warning: {}", message);
        }
        if !quiet {
            for message in &result.suggestions {
                println!("  suggestion: {}", message);
            }
        }
    }

    println!();
    println!(
        "Checked {} files ({} valid), found {} errors, {} warnings, {} suggestions in {} ms",
        summary.total_files,
        summary.valid_files,
        summary.total_errors,
        summary.total_warnings,
        summary.total_suggestions,
        summary.duration
    );
}

fn has_output(result: &LintResult, quiet: bool) -> bool {
    !result.errors.is_empty()
        || !result.warnings.is_empty()
        || (!quiet && !result.suggestions.is_empty())
}

pub fn output_project(info: &ProjectInfo) {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };

    println!("Project root:    {}", info.root.display());
    println!("Git repository:  {}", yes_no(info.has_git));
    println!(".claude folder:  {}", yes_no(info.has_claude_dir));
    println!("package.json:    {}", yes_no(info.has_package_json));
    match info.package_manager {
        Some(pm) => println!("Package manager: {}", pm),
        None => println!("Package manager: none"),
    }
    match info.config().and_then(|c| c.source.as_ref()) {
        Some(source) => println!("Configuration:   {}", source.display()),
        None => println!("Configuration:   none"),
    }
}
