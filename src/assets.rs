//! Static asset mirroring.

use crate::content::collect_files;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Mirror every file under `src` into `dest`, creating directories as needed.
///
/// With `incremental`, a file whose source is not newer than an existing
/// destination is left alone. Returns the number of files copied.
pub fn copy_static(src: &Path, dest: &Path, incremental: bool) -> Result<usize> {
    let files = collect_files(src)?;
    let copied = AtomicUsize::new(0);

    files.par_iter().try_for_each(|path| -> Result<()> {
        let rel = path.strip_prefix(src)?;
        let target = dest.join(rel);

        if incremental && is_up_to_date(path, &target) {
            return Ok(());
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(path, &target)
            .with_context(|| format!("failed to copy {}", rel.display()))?;
        copied.fetch_add(1, Ordering::Relaxed);
        Ok(())
    })?;

    Ok(copied.into_inner())
}

/// Whether `dst` exists and `src` was not modified after it.
pub fn is_up_to_date(src: &Path, dst: &Path) -> bool {
    let Ok(src_time) = src.metadata().and_then(|m| m.modified()) else {
        return false;
    };
    let Ok(dst_time) = dst.metadata().and_then(|m| m.modified()) else {
        return false;
    };
    src_time <= dst_time
}
