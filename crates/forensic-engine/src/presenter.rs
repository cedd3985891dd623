//! Read-time path rewriting.
//!
//! Reports persist internal filesystem paths; serving them publicly means
//! rewriting every artifact path under the report root to
//! `<public host>/images/<relative path>`. The rewrite happens on a clone
//! at read time only — the stored record is never mutated.

use std::path::Path;

use forensic_models::ForensicReport;

/// Return a presentable copy of `report` with artifact paths (and the
/// display image) under `report_root` rewritten to public URLs. Paths
/// outside the root are left untouched.
pub fn present(report: &ForensicReport, report_root: &Path, public_host: &str) -> ForensicReport {
    let root = report_root.to_string_lossy();
    let mut presented = report.clone();
    for outcome in presented.outcomes.values_mut() {
        for path in &mut outcome.artifact_paths {
            *path = rewrite(path, &root, public_host);
        }
    }
    if let Some(display) = &mut presented.display_image {
        *display = rewrite(display, &root, public_host);
    }
    presented
}

fn rewrite(path: &str, root: &str, public_host: &str) -> String {
    match path.strip_prefix(root) {
        Some(relative) => format!(
            "{}/images/{}",
            public_host.trim_end_matches('/'),
            relative.trim_start_matches('/')
        ),
        None => path.to_string(),
    }
}
