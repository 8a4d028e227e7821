//! Language-agnostic extraction types and trait.
//!
//! `LanguageExtractor` is the extension point for feeding another language
//! into the import-fence session. An extractor turns one source file into
//! the import events of its module.

use std::path::PathBuf;

use import_fence_core::{ImportEvent, ModuleEvent, QualifiedName};

use crate::module_path::ModulePath;

/// Errors raised while setting up or running a tree-sitter parse.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The grammar is incompatible with the linked tree-sitter runtime.
    #[error("failed to load the {language} grammar: {source}")]
    Grammar {
        /// Language identifier.
        language: &'static str,
        /// Underlying tree-sitter error.
        source: tree_sitter::LanguageError,
    },

    /// The parser returned no tree.
    #[error("{language} parser produced no syntax tree")]
    NoTree {
        /// Language identifier.
        language: &'static str,
    },
}

/// Result of analyzing a single source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAnalysis {
    /// Qualified name of the module.
    pub module: QualifiedName,
    /// Path of the source file, as discovered.
    pub file_path: PathBuf,
    /// Imports in source order.
    pub imports: Vec<ImportEvent>,
}

impl ModuleAnalysis {
    /// The module as an `enter`, `import`*, `exit` event sequence.
    pub fn into_events(self) -> impl Iterator<Item = ModuleEvent> {
        let enter = ModuleEvent::Enter {
            module: self.module,
            file: Some(self.file_path),
        };
        std::iter::once(enter)
            .chain(self.imports.into_iter().map(ModuleEvent::Import))
            .chain(std::iter::once(ModuleEvent::Exit))
    }
}

/// Trait for language-specific tree-sitter extraction.
///
/// Implement this to add support for a new language.
pub trait LanguageExtractor: Send + Sync {
    /// Language identifier (e.g., `"python"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this extractor handles (e.g., `&[".py"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Extracts the imports of `module` from its source code.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar cannot be loaded or parsing yields
    /// no tree. Syntax errors inside the file are tolerated.
    fn analyze(&self, module: &ModulePath, source: &str) -> Result<ModuleAnalysis, ExtractError>;
}
