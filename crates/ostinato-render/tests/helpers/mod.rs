//! Shared test support: a recording media library double, a fake shifter,
//! and fixture builders.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use ostinato_dsp::StereoWave;
use ostinato_render::PitchShifter;
use ostinato_score::{EventKind, Track, TrackEvent};
use ostinato_video::{Margin, MediaLibrary, Result as MediaResult, ScreenPosition};

/// One recorded transform on a mock clip.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Open(PathBuf),
    Title(String),
    Resize(f64),
    Margin(u32),
    Audio(PathBuf),
    Start(f64),
    Duration(f64),
    Position(ScreenPosition),
    Fade(f64),
}

/// A clip that is nothing but its transform history.
#[derive(Debug, Clone, PartialEq)]
pub struct MockClip {
    pub ops: Vec<Op>,
}

impl MockClip {
    fn derive(&self, op: Op) -> Self {
        let mut ops = self.ops.clone();
        ops.push(op);
        Self { ops }
    }

    pub fn start(&self) -> Option<f64> {
        self.ops.iter().rev().find_map(|op| match op {
            Op::Start(s) => Some(*s),
            _ => None,
        })
    }

    pub fn duration(&self) -> Option<f64> {
        self.ops.iter().rev().find_map(|op| match op {
            Op::Duration(d) => Some(*d),
            _ => None,
        })
    }

    pub fn audio(&self) -> Option<&PathBuf> {
        self.ops.iter().rev().find_map(|op| match op {
            Op::Audio(p) => Some(p),
            _ => None,
        })
    }

    pub fn position(&self) -> Option<ScreenPosition> {
        self.ops.iter().rev().find_map(|op| match op {
            Op::Position(p) => Some(*p),
            _ => None,
        })
    }

    pub fn opened_from(&self) -> Option<&PathBuf> {
        self.ops.iter().find_map(|op| match op {
            Op::Open(p) => Some(p),
            _ => None,
        })
    }

    pub fn is_resized(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, Op::Resize(_)))
    }

    pub fn is_title(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, Op::Title(_)))
    }

    /// A clip is closed once its duration has been fixed.
    pub fn is_closed(&self) -> bool {
        self.duration().is_some()
    }

    /// A flushed-segment placeholder: a bare `open` with no transforms.
    /// Placeholders stand for already-merged (hence closed) content.
    pub fn is_placeholder(&self) -> bool {
        self.ops.len() == 1 && matches!(self.ops[0], Op::Open(_))
    }
}

/// One recorded composite.
#[derive(Debug, Clone)]
pub struct CompositeCall {
    pub dest: PathBuf,
    pub clips: Vec<MockClip>,
}

/// Media library double: records every call, writes marker files where a
/// real backend would encode video.
#[derive(Default)]
pub struct MockMedia {
    pub composites: RefCell<Vec<CompositeCall>>,
    /// When set, composites whose destination contains this substring fail
    /// without writing anything.
    pub fail_dest_containing: RefCell<Option<String>>,
}

impl MockMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn composite_count(&self) -> usize {
        self.composites.borrow().len()
    }

    /// Composites written somewhere other than the given final staging path.
    pub fn segment_calls(&self, staging_marker: &str) -> Vec<CompositeCall> {
        self.composites
            .borrow()
            .iter()
            .filter(|c| !c.dest.display().to_string().contains(staging_marker))
            .cloned()
            .collect()
    }
}

impl MediaLibrary for MockMedia {
    type Clip = MockClip;

    fn open(&self, path: &Path) -> MediaResult<MockClip> {
        Ok(MockClip {
            ops: vec![Op::Open(path.to_path_buf())],
        })
    }

    fn duration(&self, clip: &MockClip) -> f64 {
        clip.duration().unwrap_or(10.0)
    }

    fn resized(&self, clip: &MockClip, factor: f64) -> MockClip {
        clip.derive(Op::Resize(factor))
    }

    fn with_margin(&self, clip: &MockClip, margin: Margin) -> MockClip {
        clip.derive(Op::Margin(margin.pixels))
    }

    fn with_audio(&self, clip: &MockClip, audio: &Path) -> MockClip {
        clip.derive(Op::Audio(audio.to_path_buf()))
    }

    fn starting_at(&self, clip: &MockClip, seconds: f64) -> MockClip {
        clip.derive(Op::Start(seconds))
    }

    fn lasting(&self, clip: &MockClip, seconds: f64) -> MockClip {
        clip.derive(Op::Duration(seconds))
    }

    fn positioned(&self, clip: &MockClip, position: ScreenPosition) -> MockClip {
        clip.derive(Op::Position(position))
    }

    fn faded_out(&self, clip: &MockClip, seconds: f64) -> MockClip {
        clip.derive(Op::Fade(seconds))
    }

    fn title(&self, text: &str) -> MediaResult<MockClip> {
        Ok(MockClip {
            ops: vec![Op::Title(text.to_string())],
        })
    }

    fn read_audio(&self, _path: &Path) -> MediaResult<StereoWave> {
        Ok(test_wave())
    }

    fn composite_to(&self, clips: &[MockClip], dest: &Path) -> MediaResult<()> {
        if let Some(marker) = self.fail_dest_containing.borrow().as_deref() {
            if dest.display().to_string().contains(marker) {
                return Err(ostinato_video::Error::Tool {
                    tool: "mock",
                    path: dest.to_path_buf(),
                    detail: "injected failure".into(),
                });
            }
        }
        std::fs::write(dest, b"mock-video")?;
        self.composites.borrow_mut().push(CompositeCall {
            dest: dest.to_path_buf(),
            clips: clips.to_vec(),
        });
        Ok(())
    }
}

/// Shifter double: constant tiny buffer, no vocoder work.
pub struct FakeShifter;

impl PitchShifter for FakeShifter {
    fn shift(&self, _samples: &[f32], semitones: i32) -> ostinato_dsp::Result<Vec<i16>> {
        Ok(vec![(semitones * 100) as i16; 32])
    }
}

/// Small fixed waveform for bank building.
pub fn test_wave() -> StereoWave {
    StereoWave::new(vec![0.25; 256], vec![-0.25; 256], 8000)
}

/// Build a track directly from `(delta, is_note_on, note)` triples.
pub fn note_track(events: &[(u32, bool, u8)]) -> Track {
    Track {
        name: None,
        events: events
            .iter()
            .map(|&(delta, on, note)| TrackEvent {
                delta,
                kind: if on {
                    EventKind::NoteOn { note }
                } else {
                    EventKind::NoteOff { note }
                },
            })
            .collect(),
    }
}

/// Write a multi-track MIDI file from `(delta, is_note_on, note)` triples.
pub fn write_midi_file(path: &Path, tracks: &[&[(u32, bool, u8)]]) {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(480)),
    ));
    for spec in tracks {
        let mut track = Vec::new();
        for &(delta, on, note) in spec.iter() {
            let message = if on {
                MidiMessage::NoteOn {
                    key: u7::new(note),
                    vel: u7::new(64),
                }
            } else {
                MidiMessage::NoteOff {
                    key: u7::new(note),
                    vel: u7::new(0),
                }
            };
            track.push(midly::TrackEvent {
                delta: u28::new(delta),
                kind: TrackEventKind::Midi {
                    channel: u4::new(0),
                    message,
                },
            });
        }
        track.push(midly::TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(track);
    }
    smf.save(path).expect("write MIDI fixture");
}
