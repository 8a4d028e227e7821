//! # import-fence-py
//!
//! Tree-sitter based Python front end for import-fence.
//!
//! This crate turns Python source trees into the module event stream the
//! `import-fence-core` session consumes, and answers its export-list
//! queries from `__all__`:
//!
//! - [`module_name_for`] maps a file below a source root to its module name
//! - [`LanguageExtractor`] trait for pluggable language support
//! - [`PythonExtractor`] for Python import extraction
//! - [`extract_dunder_all`] for static `__all__` extraction
//! - [`SourceTreeResolver`], an [`ExportResolver`](import_fence_core::ExportResolver)
//!   reading `__all__` from disk

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod exports;
pub mod extractor;
pub mod module_path;
pub mod python;

pub use exports::{extract_dunder_all, SourceTreeResolver};
pub use extractor::{ExtractError, LanguageExtractor, ModuleAnalysis};
pub use module_path::{module_name_for, ModulePath};
pub use python::PythonExtractor;
