//! Writing the converted configuration to disk

use stackshift_core::{BlockKind, Configuration, render_blocks};
use std::path::{Path, PathBuf};

/// Top-level block kinds, in file order
pub const FILE_ORDER: [BlockKind; 5] = [
    BlockKind::Variable,
    BlockKind::Data,
    BlockKind::Locals,
    BlockKind::Resource,
    BlockKind::Output,
];

/// File that holds blocks of the given kind
pub fn file_name(kind: &BlockKind) -> String {
    format!("{}.tf", kind.keyword())
}

/// Write one file per block kind into `dir`, skipping kinds with no blocks
///
/// Returns the written paths in file order.
pub fn write_files(configuration: &Configuration, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for kind in &FILE_ORDER {
        let content = render_blocks(configuration.of_kind(kind));
        if content.is_empty() {
            continue;
        }
        let path = dir.join(file_name(kind));
        std::fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), "wrote file");
        written.push(path);
    }
    Ok(written)
}
