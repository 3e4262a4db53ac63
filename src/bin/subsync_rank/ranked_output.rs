use std::fs;
use std::path::{Path, PathBuf};

use subsync_rank::RankingResult;

/// Copies ranked subtitles into `out_dir` as `1.srt`, `2.srt`, ... in rank order.
pub fn copy_ranked(
    result: &RankingResult,
    subtitles_dir: &Path,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, String> {
    fs::create_dir_all(out_dir).map_err(|err| {
        format!(
            "Failed to create ranked output directory '{}': {err}",
            out_dir.display()
        )
    })?;

    let mut written = Vec::with_capacity(result.ranked.len());
    for (idx, record) in result.ranked.iter().enumerate() {
        let source = subtitles_dir.join(&record.id);
        let target = out_dir.join(format!("{}.srt", idx + 1));
        fs::copy(&source, &target).map_err(|err| {
            format!(
                "Failed to copy '{}' to '{}': {err}",
                source.display(),
                target.display()
            )
        })?;
        written.push(target);
    }
    Ok(written)
}
