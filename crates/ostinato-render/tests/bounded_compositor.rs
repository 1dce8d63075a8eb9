//! Bounded-memory invariants of the clip arena.

mod helpers;

use std::path::{Path, PathBuf};

use helpers::{MockClip, MockMedia, Op};
use ostinato_render::{Compositor, OpenNotes};
use ostinato_video::MediaLibrary;

fn dest_in(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("out.mp4")
}

fn source_clip(media: &MockMedia) -> MockClip {
    media.open(Path::new("src.mp4")).unwrap()
}

#[test]
fn test_ceiling_is_never_exceeded_after_flush() {
    let dir = tempfile::tempdir().unwrap();
    let media = MockMedia::new();
    let ceiling = 4;
    let mut compositor = Compositor::new(&media, &dest_in(&dir), ceiling);
    let mut open = OpenNotes::new();
    let base = source_clip(&media);

    for i in 0..40u32 {
        // Open a note, close it right away: every clip is flushable.
        let index = compositor.push(media.starting_at(&base, i as f64));
        open.open(60, index, i as f64);
        let note = open.close(60).unwrap();
        compositor.close(note.clip_index, 0.5, 0.1);
        compositor.enforce_ceiling(&mut open).unwrap();

        assert!(
            compositor.len() <= ceiling,
            "arena grew to {} with ceiling {ceiling}",
            compositor.len()
        );
    }

    // Flushes actually happened and left their segments on disk.
    assert!(!compositor.segments().is_empty());
    for segment in compositor.segments() {
        assert!(segment.exists(), "missing segment {}", segment.display());
    }
}

#[test]
fn test_flushed_segments_contain_only_closed_clips() {
    let dir = tempfile::tempdir().unwrap();
    let media = MockMedia::new();
    let ceiling = 5;
    let mut compositor = Compositor::new(&media, &dest_in(&dir), ceiling);
    let mut open = OpenNotes::new();
    let base = source_clip(&media);

    // One long-lived note is always open while short notes churn past the
    // ceiling; each round rotates the held note so the flush boundary keeps
    // advancing.
    let mut held_pitch = 40u8;
    let mut held_start = 1000.0;
    let index = compositor.push(media.starting_at(&base, held_start));
    open.open(held_pitch, index, held_start);

    for round in 0..5u32 {
        for i in 0..8u32 {
            let t = 2000.0 + (round * 8 + i) as f64;
            let index = compositor.push(media.starting_at(&base, t));
            open.open(60, index, t);
            let note = open.close(60).unwrap();
            compositor.close(note.clip_index, 0.25, 0.1);
            compositor.enforce_ceiling(&mut open).unwrap();
        }

        // Open the replacement before closing the old held note, so at least
        // one note is open at every instant. Distinct pitch: same-pitch
        // close would pop the replacement (LIFO).
        held_pitch += 1;
        held_start += 1.0;
        let index = compositor.push(media.starting_at(&base, held_start));
        open.open(held_pitch, index, held_start);
        let note = open.close(held_pitch - 1).unwrap();
        compositor.close(note.clip_index, 0.5, 0.1);
        compositor.enforce_ceiling(&mut open).unwrap();
    }

    // Flushes happened, and no flushed clip was still open when it left
    // memory. Earlier placeholders may be re-merged; they are closed content
    // by construction.
    assert!(media.composite_count() > 0);
    for call in media.composites.borrow().iter() {
        for clip in &call.clips {
            assert!(
                clip.is_closed() || clip.is_placeholder(),
                "open clip leaked into segment {}",
                call.dest.display()
            );
        }
    }

    // Closing the survivor still lands on the right clip despite rebasing.
    let note = open.close(held_pitch).unwrap();
    compositor.close(note.clip_index, 123.0, 0.1);
    let (clips, _) = compositor.into_parts();
    let tagged: Vec<&MockClip> = clips
        .iter()
        .filter(|c| c.duration() == Some(123.0))
        .collect();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].start(), Some(held_start));
}

#[test]
fn test_flush_collapses_prefix_into_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let media = MockMedia::new();
    let mut compositor = Compositor::new(&media, &dest_in(&dir), 3);
    let mut open = OpenNotes::new();
    let base = source_clip(&media);

    // Lead clip, closed immediately.
    let lead = compositor.push(media.lasting(&base, 1.0));
    assert_eq!(lead, 0);

    let first = compositor.push(media.starting_at(&base, 1.0));
    open.open(60, first, 1000.0);
    let second = compositor.push(media.starting_at(&base, 2.0));
    open.open(64, second, 2000.0);

    // Ceiling reached but the earliest open note is at index 1: merging a
    // one-clip prefix frees nothing, so nothing is flushed yet.
    compositor.enforce_ceiling(&mut open).unwrap();
    assert_eq!(compositor.len(), 3);
    assert!(compositor.segments().is_empty());

    // Close the first note; now the prefix [lead, first] is flushable.
    let note = open.close(60).unwrap();
    compositor.close(note.clip_index, 0.5, 0.1);
    compositor.enforce_ceiling(&mut open).unwrap();

    assert_eq!(compositor.len(), 2); // placeholder + still-open clip
    assert_eq!(compositor.segments().len(), 1);
    let segment = compositor.segments()[0].clone();
    assert!(segment
        .display()
        .to_string()
        .ends_with("out.mp4.segment0.mp4"));

    // The open note was rebased onto the surviving clip.
    let note = open.close(64).unwrap();
    assert_eq!(note.clip_index, 1);
    compositor.close(note.clip_index, 9.0, 0.1);

    let (clips, segments) = compositor.into_parts();
    assert_eq!(segments, vec![segment.clone()]);
    // Placeholder is the reloaded segment file.
    assert_eq!(clips[0].ops, vec![Op::Open(segment)]);
    assert_eq!(clips[1].duration(), Some(9.0));
    assert_eq!(clips[1].start(), Some(2.0));
}

#[test]
fn test_flush_without_open_notes_merges_everything() {
    let dir = tempfile::tempdir().unwrap();
    let media = MockMedia::new();
    let mut compositor = Compositor::new(&media, &dest_in(&dir), 3);
    let mut open = OpenNotes::new();
    let base = source_clip(&media);

    for i in 0..3 {
        let index = compositor.push(media.starting_at(&base, i as f64));
        compositor.close(index, 0.5, 0.1);
    }
    compositor.enforce_ceiling(&mut open).unwrap();

    // Whole arena collapsed into one placeholder.
    assert_eq!(compositor.len(), 1);
    assert_eq!(compositor.segments().len(), 1);
    assert_eq!(media.composites.borrow()[0].clips.len(), 3);
}
