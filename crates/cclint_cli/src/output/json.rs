//! JSON output formatter

use cclint_core::{LintSummary, ProjectInfo};
use miette::{IntoDiagnostic, Result};

pub fn output_json(summary: &LintSummary) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(summary).into_diagnostic()?
    );
    Ok(())
}

pub fn output_project(info: &ProjectInfo) -> Result<()> {
    let output = serde_json::json!({
        "root": info.root.display().to_string(),
        "hasGit": info.has_git,
        "hasClaudeDir": info.has_claude_dir,
        "hasPackageJson": info.has_package_json,
        "packageManager": info.package_manager,
        "configFile": info
            .config()
            .and_then(|c| c.source.as_ref())
            .map(|p| p.display().to_string()),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}
