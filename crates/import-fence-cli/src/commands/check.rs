//! Check command implementation.

use anyhow::{anyhow, Context, Result};
use import_fence_core::{AnalysisSession, Config, LintResult};
use import_fence_py::{module_name_for, LanguageExtractor, PythonExtractor, SourceTreeResolver};
use std::path::{Path, PathBuf};

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Runs the check command and returns the process exit code.
pub fn run(
    path: &Path,
    format: OutputFormat,
    exclude: &[String],
    source: &ConfigSource,
) -> Result<i32> {
    let config = source.load()?;
    let session = config
        .session()
        .map_err(|e| anyhow!("{:?}", miette::Report::new(e)))?;
    let result = analyze(path, &config, &session, exclude)?;

    super::output::print(&result, format)?;

    Ok(i32::from(result.has_violations_at(config.fail_on())))
}

/// Walks the source root and checks every Python module.
pub(crate) fn analyze(
    path: &Path,
    config: &Config,
    session: &AnalysisSession,
    exclude: &[String],
) -> Result<LintResult> {
    let root = if config.analyzer.root.is_absolute() {
        config.analyzer.root.clone()
    } else {
        path.join(&config.analyzer.root)
    };

    let patterns = config
        .analyzer
        .exclude
        .iter()
        .chain(exclude)
        .map(|p| glob::Pattern::new(p).with_context(|| format!("Invalid exclude pattern: {p}")))
        .collect::<Result<Vec<_>>>()?;

    let extractor = PythonExtractor::new();
    let resolver = SourceTreeResolver::new(&root);
    let files = discover_files(&root, config.analyzer.respect_gitignore, &patterns, &extractor)?;

    tracing::info!(
        "Analyzing {} {} files under {}",
        files.len(),
        extractor.language_id(),
        root.display()
    );

    let mut result = LintResult::new();

    for file_path in &files {
        let Some(mut module) = module_name_for(&root, file_path) else {
            tracing::debug!("Skipping {}: not a module below the root", file_path.display());
            continue;
        };
        module.file = file_path
            .strip_prefix(&root)
            .unwrap_or(file_path)
            .to_path_buf();

        let source = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        let analysis = extractor
            .analyze(&module, &source)
            .with_context(|| format!("Failed to parse {}", file_path.display()))?;

        let checked = session
            .run(analysis.into_events(), &resolver, &mut result)
            .context("Module event stream out of order")?;
        result.modules_checked += checked;
    }

    result.sort();
    Ok(result)
}

fn discover_files(
    root: &Path,
    respect_gitignore: bool,
    exclude: &[glob::Pattern],
    extractor: &dyn LanguageExtractor,
) -> Result<Vec<PathBuf>> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(respect_gitignore)
        .require_git(false);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        if !extractor.extensions().contains(&ext.as_str()) {
            continue;
        }

        let rel = path.strip_prefix(root).unwrap_or(path);
        if exclude.iter().any(|pattern| pattern.matches_path(rel)) {
            tracing::debug!("Excluding: {}", rel.display());
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}
