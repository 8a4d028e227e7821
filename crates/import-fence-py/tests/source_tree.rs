//! Integration test: Python files on disk through extractor, resolver and
//! session.

use import_fence_core::{AnalysisSession, LintResult, ViolationKind};
use import_fence_py::{module_name_for, LanguageExtractor, PythonExtractor, SourceTreeResolver};
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("file has a parent")).expect("create dirs");
    fs::write(path, content).expect("write fixture");
}

fn check(root: &Path, files: &[&str], session: &AnalysisSession) -> LintResult {
    let extractor = PythonExtractor::new();
    let resolver = SourceTreeResolver::new(root);
    let mut result = LintResult::new();

    for rel in files {
        let path = root.join(rel);
        let module = module_name_for(root, &path).expect("file below root");
        let source = fs::read_to_string(&path).expect("read fixture");
        let analysis = extractor.analyze(&module, &source).expect("parse fixture");
        let checked = session
            .run(analysis.into_events(), &resolver, &mut result)
            .expect("well-formed events");
        result.modules_checked += checked;
    }

    result.sort();
    result
}

#[test]
fn marketplace_boundaries() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path();

    write(root, "auctions/__init__.py", "__all__ = ['AuctionService']\n");
    write(root, "auctions/domain/__init__.py", "__all__ = ['Bid']\n");
    write(root, "auctions/domain/internal.py", "from . import Bid\n");
    write(
        root,
        "checkout/flow.py",
        "\
from auctions import AuctionService
from auctions.domain import Bid, _ledger
import catalog.api

def late():
    from billing import charge
",
    );
    write(root, "catalog/api.py", "");
    write(root, "billing/__init__.py", "charge = None\n");

    let session = AnalysisSession::builder()
        .allowed_dependencies(["checkout->auctions", "catalog->auctions"])
        .encapsulated_packages(["auctions", "auctions.domain", "billing"])
        .build()
        .expect("rules compile");

    let result = check(
        root,
        &[
            "auctions/domain/internal.py",
            "checkout/flow.py",
            "catalog/api.py",
        ],
        &session,
    );

    assert_eq!(result.modules_checked, 3);

    let kinds: Vec<_> = result.violations.iter().map(|v| v.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            ViolationKind::EncapsulationViolated {
                offending_symbol: "_ledger".into(),
                protected_package: "auctions.domain".into(),
            },
            ViolationKind::ForbiddenDependency {
                offending_package: "catalog".into(),
                importing_package: "checkout".into(),
            },
        ]
    );

    let line_of = |code: &str| {
        result
            .violations
            .iter()
            .find(|v| v.code == code)
            .and_then(|v| v.location.as_ref())
            .map(|l| l.line)
    };
    assert_eq!(line_of("IF002"), Some(2));
    assert_eq!(line_of("IF001"), Some(3));

    assert_eq!(result.degraded.len(), 1);
    assert_eq!(result.degraded[0].module, "checkout.flow");
    assert_eq!(result.degraded[0].protected_package, "billing");
}
