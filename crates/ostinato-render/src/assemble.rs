//! Final assembly.
//!
//! Merges everything still in memory (including placeholder clips standing
//! in for flushed segments) into the destination file, then cleans up the
//! segments. The composite goes to a staging path first and is renamed onto
//! the destination only on success, so a failed run never leaves a partial
//! or truncated output — and never deletes segments it did not subsume.

use std::path::{Path, PathBuf};

use ostinato_video::{MediaLibrary, ScreenPosition};
use tracing::{debug, info, warn};

use crate::compose::Compositor;
use crate::error::Result;

/// Duration of the closing title card.
const TITLE_SECONDS: f64 = 1.0;

/// Compose the remaining clips plus a terminal title card into `dest`.
///
/// `end_watermark` is the latest clip end time; the title card starts there.
/// Segment files are deleted in creation order, only after the rename lands.
pub fn assemble<M: MediaLibrary>(
    media: &M,
    compositor: Compositor<'_, M>,
    end_watermark: f64,
    dest: &Path,
    title_text: &str,
) -> Result<()> {
    let (mut clips, segments) = compositor.into_parts();

    let title = media.title(title_text)?;
    let title = media.lasting(&title, TITLE_SECONDS);
    let title = media.starting_at(&title, end_watermark);
    let title = media.positioned(&title, ScreenPosition::Center);
    clips.push(title);

    let staging = staging_path(dest);
    info!(
        clips = clips.len(),
        dest = %dest.display(),
        "compositing final video"
    );
    if let Err(err) = media.composite_to(&clips, &staging) {
        let _ = std::fs::remove_file(&staging);
        return Err(err.into());
    }
    std::fs::rename(&staging, dest)?;

    for segment in &segments {
        match std::fs::remove_file(segment) {
            Ok(()) => debug!(segment = %segment.display(), "removed temporary segment"),
            // The output is already complete; a leftover temp file is not
            // worth failing the run over.
            Err(err) => warn!(segment = %segment.display(), %err, "could not remove segment"),
        }
    }
    Ok(())
}

/// Staging path next to the destination, keeping the container extension so
/// the media backend can infer the format.
fn staging_path(dest: &Path) -> PathBuf {
    match dest.extension() {
        Some(ext) => dest.with_extension(format!("part.{}", ext.to_string_lossy())),
        None => dest.with_extension("part"),
    }
}
