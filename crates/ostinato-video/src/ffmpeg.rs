//! `ffmpeg`-backed media library.
//!
//! Clips are descriptors: transforms only record what to do, and the whole
//! edit is realized as a single `ffmpeg` invocation per composite. Metadata
//! comes from `ffprobe`. Both tools must be on `PATH`.

use std::path::{Path, PathBuf};
use std::process::Command;

use ostinato_dsp::StereoWave;
use tracing::debug;

use crate::clip::{Margin, ScreenPosition};
use crate::error::{Error, Result};
use crate::library::MediaLibrary;

/// Media library backed by the ffmpeg command-line tools.
pub struct FfmpegLibrary {
    ffmpeg: String,
    ffprobe: String,
    sample_rate: u32,
}

impl FfmpegLibrary {
    /// Library using `ffmpeg`/`ffprobe` from `PATH` at 44.1 kHz.
    pub fn new() -> Self {
        Self {
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
            sample_rate: 44_100,
        }
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Probe duration and video dimensions.
    fn probe(&self, path: &Path) -> Result<(f64, u32, u32)> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height:format=duration"])
            .args(["-of", "default=noprint_wrappers=1"])
            .arg(path)
            .output()?;
        if !output.status.success() {
            return Err(Error::Tool {
                tool: "ffprobe",
                path: path.to_path_buf(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let mut duration = None;
        let mut width = 0u32;
        let mut height = 0u32;
        for line in text.lines() {
            match line.split_once('=') {
                Some(("duration", v)) => duration = v.trim().parse::<f64>().ok(),
                Some(("width", v)) => width = v.trim().parse().unwrap_or(0),
                Some(("height", v)) => height = v.trim().parse().unwrap_or(0),
                _ => {}
            }
        }

        let duration = duration.ok_or_else(|| Error::Probe {
            path: path.to_path_buf(),
            detail: "no duration in probe output".into(),
        })?;
        Ok((duration, width, height))
    }
}

impl Default for FfmpegLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum ClipSource {
    File(PathBuf),
    Title(String),
}

/// Accumulated edit state for one clip.
#[derive(Debug, Clone)]
pub struct FfmpegClip {
    source: ClipSource,
    base_duration: f64,
    width: u32,
    height: u32,
    scale: f64,
    margins: Vec<Margin>,
    audio: Option<PathBuf>,
    start: f64,
    duration: Option<f64>,
    position: Option<ScreenPosition>,
    fade_out: Option<f64>,
}

impl FfmpegClip {
    /// Duration after transforms: the explicit one when set.
    fn effective_duration(&self) -> f64 {
        self.duration.unwrap_or(self.base_duration)
    }

    /// End time on the composite timeline.
    fn end(&self) -> f64 {
        self.start + self.effective_duration()
    }
}

impl MediaLibrary for FfmpegLibrary {
    type Clip = FfmpegClip;

    fn open(&self, path: &Path) -> Result<Self::Clip> {
        let (duration, width, height) = self.probe(path)?;
        debug!(path = %path.display(), duration, width, height, "opened clip");
        Ok(FfmpegClip {
            source: ClipSource::File(path.to_path_buf()),
            base_duration: duration,
            width,
            height,
            scale: 1.0,
            margins: Vec::new(),
            audio: None,
            start: 0.0,
            duration: None,
            position: None,
            fade_out: None,
        })
    }

    fn duration(&self, clip: &Self::Clip) -> f64 {
        clip.effective_duration()
    }

    fn resized(&self, clip: &Self::Clip, factor: f64) -> Self::Clip {
        let mut out = clip.clone();
        out.scale *= factor;
        out
    }

    fn with_margin(&self, clip: &Self::Clip, margin: Margin) -> Self::Clip {
        let mut out = clip.clone();
        out.margins.push(margin);
        out
    }

    fn with_audio(&self, clip: &Self::Clip, audio: &Path) -> Self::Clip {
        let mut out = clip.clone();
        out.audio = Some(audio.to_path_buf());
        out
    }

    fn starting_at(&self, clip: &Self::Clip, seconds: f64) -> Self::Clip {
        let mut out = clip.clone();
        out.start = seconds;
        out
    }

    fn lasting(&self, clip: &Self::Clip, seconds: f64) -> Self::Clip {
        let mut out = clip.clone();
        out.duration = Some(seconds);
        out
    }

    fn positioned(&self, clip: &Self::Clip, position: ScreenPosition) -> Self::Clip {
        let mut out = clip.clone();
        out.position = Some(position);
        out
    }

    fn faded_out(&self, clip: &Self::Clip, seconds: f64) -> Self::Clip {
        let mut out = clip.clone();
        out.fade_out = Some(seconds);
        out
    }

    fn title(&self, text: &str) -> Result<Self::Clip> {
        Ok(FfmpegClip {
            source: ClipSource::Title(text.to_string()),
            base_duration: 1.0,
            width: 0,
            height: 0,
            scale: 1.0,
            margins: Vec::new(),
            audio: None,
            start: 0.0,
            duration: None,
            position: None,
            fade_out: None,
        })
    }

    fn read_audio(&self, path: &Path) -> Result<StereoWave> {
        // Decode to a temp WAV rather than a pipe: ffmpeg cannot patch RIFF
        // sizes on a non-seekable output.
        let tmp = std::env::temp_dir().join(format!(
            "ostinato-audio-{}-{}.wav",
            std::process::id(),
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));

        let output = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-y", "-i"])
            .arg(path)
            .args(["-vn", "-ac", "2", "-ar", &self.sample_rate.to_string()])
            .args(["-f", "wav"])
            .arg(&tmp)
            .output()?;
        if !output.status.success() {
            let detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let _ = std::fs::remove_file(&tmp);
            if detail.contains("does not contain any stream") {
                return Err(Error::NoAudio(path.to_path_buf()));
            }
            return Err(Error::Tool {
                tool: "ffmpeg",
                path: path.to_path_buf(),
                detail,
            });
        }

        let wave = read_wav(&tmp);
        let _ = std::fs::remove_file(&tmp);
        wave
    }

    fn composite_to(&self, clips: &[Self::Clip], dest: &Path) -> Result<()> {
        let graph = CompositeGraph::build(clips);
        debug!(
            clips = clips.len(),
            dest = %dest.display(),
            "compositing"
        );

        let mut command = Command::new(&self.ffmpeg);
        command.args(["-v", "error", "-y"]);
        for input in &graph.inputs {
            command.args(input.iter().map(String::as_str));
        }
        command.args(["-filter_complex", &graph.filter]);
        command.args(["-map", "[vout]"]);
        if graph.has_audio {
            command.args(["-map", "[aout]"]);
        }
        command.args(["-t", &format!("{:.3}", graph.total)]);
        command.arg(dest);

        let output = command.output()?;
        if !output.status.success() {
            // Never leave a partial file where a caller might mistake it for
            // a finished composite.
            let _ = std::fs::remove_file(dest);
            return Err(Error::Tool {
                tool: "ffmpeg",
                path: dest.to_path_buf(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Decode a stereo WAV file.
fn read_wav(path: &Path) -> Result<StereoWave> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    Ok(StereoWave::from_interleaved(&interleaved, spec.sample_rate))
}

/// One ffmpeg invocation's inputs and filter graph.
struct CompositeGraph {
    inputs: Vec<Vec<String>>,
    filter: String,
    has_audio: bool,
    total: f64,
}

impl CompositeGraph {
    fn build(clips: &[FfmpegClip]) -> Self {
        // Canvas takes the first real video's unscaled dimensions.
        let (canvas_w, canvas_h) = clips
            .iter()
            .find(|c| c.width > 0 && c.height > 0)
            .map(|c| (c.width, c.height))
            .unwrap_or((1280, 720));
        let total = clips.iter().map(FfmpegClip::end).fold(1.0f64, f64::max);

        let mut inputs: Vec<Vec<String>> = Vec::new();
        let mut chains: Vec<String> = Vec::new();
        let mut audio_labels: Vec<String> = Vec::new();

        chains.push(format!(
            "color=c=black:s={canvas_w}x{canvas_h}:d={total:.3}[base]"
        ));

        for (i, clip) in clips.iter().enumerate() {
            let input_index = inputs.len();
            let duration = clip.effective_duration();

            let mut ops: Vec<String> = Vec::new();
            match &clip.source {
                ClipSource::File(path) => {
                    inputs.push(vec!["-i".into(), path.display().to_string()]);
                    ops.push(format!("trim=0:{duration:.3}"));
                    ops.push("setpts=PTS-STARTPTS".into());
                    if (clip.scale - 1.0).abs() > f64::EPSILON {
                        let s = clip.scale;
                        ops.push(format!(
                            "scale=trunc(iw*{s:.4}/2)*2:trunc(ih*{s:.4}/2)*2"
                        ));
                    }
                    for margin in &clip.margins {
                        let m = margin.pixels;
                        let [r, g, b] = margin.color;
                        ops.push(format!(
                            "pad=iw+{0}:ih+{0}:{m}:{m}:color=0x{r:02x}{g:02x}{b:02x}@{1:.2}",
                            2 * m,
                            margin.opacity
                        ));
                    }
                }
                ClipSource::Title(text) => {
                    inputs.push(vec![
                        "-f".into(),
                        "lavfi".into(),
                        "-i".into(),
                        format!("color=c=black:s={canvas_w}x{canvas_h}:d={duration:.3}"),
                    ]);
                    ops.push(format!(
                        "drawtext=text='{}':fontcolor=white:fontsize=70:\
                         x=(w-text_w)/2:y=(h-text_h)/2",
                        escape_drawtext(text)
                    ));
                }
            }
            if let Some(fade) = clip.fade_out {
                ops.push("format=yuva420p".into());
                ops.push(format!(
                    "fade=t=out:st={:.3}:d={fade:.3}:alpha=1",
                    (duration - fade).max(0.0)
                ));
            }
            ops.push(format!("setpts=PTS+{:.3}/TB", clip.start));
            chains.push(format!("[{input_index}:v]{}[v{i}]", ops.join(",")));

            if let Some(audio) = &clip.audio {
                let audio_index = inputs.len();
                inputs.push(vec!["-i".into(), audio.display().to_string()]);
                let delay_ms = (clip.start * 1000.0).round() as u64;
                let mut audio_ops = vec![format!("atrim=0:{duration:.3}")];
                if let Some(fade) = clip.fade_out {
                    audio_ops.push(format!(
                        "afade=t=out:st={:.3}:d={fade:.3}",
                        (duration - fade).max(0.0)
                    ));
                }
                audio_ops.push(format!("adelay={delay_ms}|{delay_ms}"));
                chains.push(format!("[{audio_index}:a]{}[a{i}]", audio_ops.join(",")));
                audio_labels.push(format!("[a{i}]"));
            }
        }

        // Stack overlays bottom-up in clip order.
        if clips.is_empty() {
            chains.push("[base]null[vout]".into());
        }
        let mut below = "[base]".to_string();
        for (i, clip) in clips.iter().enumerate() {
            let above = if i + 1 == clips.len() {
                "[vout]".to_string()
            } else {
                format!("[o{i}]")
            };
            let (x, y) = overlay_coords(clip.position);
            chains.push(format!(
                "{below}[v{i}]overlay=x={x}:y={y}:eof_action=pass{above}"
            ));
            below = above;
        }

        let has_audio = !audio_labels.is_empty();
        if has_audio {
            chains.push(format!(
                "{}amix=inputs={}:duration=longest:normalize=0[aout]",
                audio_labels.concat(),
                audio_labels.len()
            ));
        }

        Self {
            inputs,
            filter: chains.join(";"),
            has_audio,
            total,
        }
    }
}

/// Overlay x/y expressions for a canvas position.
///
/// `W`/`H` are the canvas, `w`/`h` the overlaid clip.
fn overlay_coords(position: Option<ScreenPosition>) -> (&'static str, &'static str) {
    use ScreenPosition::*;
    match position {
        None | Some(Center) => ("(W-w)/2", "(H-h)/2"),
        Some(LeftBottom) => ("0", "H-h"),
        Some(RightBottom) => ("W-w", "H-h"),
        Some(LeftTop) => ("0", "0"),
        Some(RightTop) => ("W-w", "0"),
        Some(CenterBottom) => ("(W-w)/2", "H-h"),
        Some(CenterTop) => ("(W-w)/2", "0"),
        Some(LeftCenter) => ("0", "(H-h)/2"),
        Some(RightCenter) => ("W-w", "(H-h)/2"),
    }
}

/// Escape a string for use inside a drawtext filter argument.
fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' | ':' | '\\' | '%' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
