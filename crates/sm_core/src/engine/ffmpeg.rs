//! Final render through a single ffmpeg `-filter_complex` invocation.
//!
//! `FilterGraph` turns a reconciled `Timeline` into ffmpeg inputs and a
//! filter graph:
//! - each track is scaled and cropped into its slot, joined with `xfade` or
//!   `concat`, repeated `loops` times and trimmed to the governing duration
//! - stacked tracks are joined with `vstack`
//! - subtitles are burned from a styled ASS script
//! - entrance and exit effects run last, on the whole frame
//! - audio layers are fitted, gained and summed with `amix`

use std::path::Path;

use super::process::ToolRunner;
use super::{RenderEngine, RenderOutput, RenderRequest};
use crate::config::OutputSettings;
use crate::error::{ComposeError, ComposeResult};
use crate::models::{
    AppliedTransitions, AudioKind, ClampedTransition, CompositeAudio, FittedTrack, GainEnvelope,
    LayerFit, MediaItem, Resolution, TransitionKind,
};

/// Sample format every audio branch is converted to before mixing.
const AUDIO_FORMAT: &str = "aformat=sample_rates=44100:channel_layouts=stereo";

/// Format seconds for filter arguments.
///
/// Microsecond precision keeps per-item lengths summing to the track length
/// after uneven splits such as D/3.
fn secs(value: f64) -> String {
    format!("{:.6}", value.max(0.0))
}

/// Format a gain multiplier.
fn gain(value: f64) -> String {
    format!("{:.4}", value.max(0.0))
}

/// `[a][b][c]` for a list of pad labels.
fn labels(names: &[String]) -> String {
    names.iter().map(|n| format!("[{}]", n)).collect()
}

/// Name of the ffmpeg `xfade` transition used between items.
pub(crate) fn xfade_name(kind: TransitionKind) -> &'static str {
    match kind {
        TransitionKind::None | TransitionKind::Fade => "fade",
        TransitionKind::SlideLeft => "slideleft",
        TransitionKind::SlideRight => "slideright",
        TransitionKind::SlideUp => "slideup",
        TransitionKind::SlideDown => "slidedown",
        TransitionKind::ZoomIn => "zoomin",
        TransitionKind::ZoomOut => "circleclose",
    }
}

/// Escape a file path for use as a filter option value.
fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut escaped = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '\\' | '\'' | ':' | '[' | ']' | ',' | ';' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `if(lt(t,..),entrance,if(gte(t,..),exit,rest))` over the two edge phases.
fn phase_expr(entrance: Option<(f64, String)>, exit: Option<(f64, String)>, rest: &str) -> String {
    let tail = match exit {
        Some((start, expr)) => format!("if(gte(t,{}),{},{})", secs(start), expr, rest),
        None => rest.to_string(),
    };
    match entrance {
        Some((end, expr)) => format!("if(lt(t,{}),{},{})", secs(end), expr, tail),
        None => tail,
    }
}

/// Progress through the entrance (0 → 1).
fn entrance_progress(t: &ClampedTransition) -> String {
    format!("(t/{})", secs(t.duration))
}

/// Progress through the exit (0 → 1).
fn exit_progress(t: &ClampedTransition) -> String {
    format!("((t-{})/{})", secs(t.start), secs(t.duration))
}

/// Scale factor over time for zoom effects, or None when nothing zooms.
fn zoom_expr(edges: &AppliedTransitions) -> Option<String> {
    let entrance = edges.entrance.and_then(|t| {
        let p = entrance_progress(&t);
        match t.kind {
            TransitionKind::ZoomIn => Some((t.end(), p)),
            TransitionKind::ZoomOut => Some((t.end(), format!("(2-{})", p))),
            _ => None,
        }
    });
    let exit = edges.exit.and_then(|t| {
        let p = exit_progress(&t);
        match t.kind {
            TransitionKind::ZoomIn => Some((t.start, format!("(1+{})", p))),
            TransitionKind::ZoomOut => Some((t.start, format!("(1-{})", p))),
            _ => None,
        }
    });
    if entrance.is_none() && exit.is_none() {
        return None;
    }
    Some(format!("max(0.01,{})", phase_expr(entrance, exit, "1")))
}

/// Horizontal and vertical slide offsets over time.
fn slide_exprs(edges: &AppliedTransitions, res: Resolution) -> (String, String) {
    let w = res.width as f64;
    let h = res.height as f64;

    // Entrance: content starts one frame away and arrives at 0.
    let entrance = |axis_x: bool| {
        edges.entrance.and_then(|t| {
            let remaining = format!("(1-{})", entrance_progress(&t));
            let offset = match (t.kind, axis_x) {
                (TransitionKind::SlideLeft, true) => format!("{}*{}", w, remaining),
                (TransitionKind::SlideRight, true) => format!("-{}*{}", w, remaining),
                (TransitionKind::SlideUp, false) => format!("{}*{}", h, remaining),
                (TransitionKind::SlideDown, false) => format!("-{}*{}", h, remaining),
                _ => return None,
            };
            Some((t.end(), offset))
        })
    };
    // Exit: content leaves in the slide direction.
    let exit = |axis_x: bool| {
        edges.exit.and_then(|t| {
            let p = exit_progress(&t);
            let offset = match (t.kind, axis_x) {
                (TransitionKind::SlideLeft, true) => format!("-{}*{}", w, p),
                (TransitionKind::SlideRight, true) => format!("{}*{}", w, p),
                (TransitionKind::SlideUp, false) => format!("-{}*{}", h, p),
                (TransitionKind::SlideDown, false) => format!("{}*{}", h, p),
                _ => return None,
            };
            Some((t.start, offset))
        })
    };

    (
        phase_expr(entrance(true), exit(true), "0"),
        phase_expr(entrance(false), exit(false), "0"),
    )
}

/// `volume` filter for a gain envelope.
fn volume_filter(envelope: &GainEnvelope) -> String {
    let segments = &envelope.segments;
    match segments.split_last() {
        None => "volume=1.0000".to_string(),
        Some((last, _)) if envelope.is_constant() => format!("volume={}", gain(last.gain)),
        Some((last, rest)) => {
            let expr = rest.iter().rev().fold(gain(last.gain), |acc, seg| {
                format!("if(lt(t,{}),{},{})", secs(seg.end), gain(seg.gain), acc)
            });
            format!("volume='{}':eval=frame", expr)
        }
    }
}

/// Comma-joined names of the motion effects on the clip.
fn motion_kinds(edges: &AppliedTransitions) -> String {
    edges
        .entrance
        .iter()
        .chain(edges.exit.iter())
        .filter(|t| t.kind.is_motion())
        .map(|t| t.kind.name())
        .collect::<Vec<_>>()
        .join(",")
}

/// Output labels of one rendered track.
struct TrackLabels {
    video: String,
    audio: Option<String>,
}

/// ffmpeg inputs plus the filter graph for one render.
#[derive(Debug, Clone)]
pub struct FilterGraph {
    inputs: Vec<Vec<String>>,
    chains: Vec<String>,
    video_out: String,
    audio_out: String,
}

impl FilterGraph {
    /// Build the graph for a render request.
    pub fn build(request: &RenderRequest) -> ComposeResult<Self> {
        let timeline = &request.timeline;
        if timeline.duration.is_nan() || timeline.duration <= 0.0 {
            return Err(ComposeError::render(format!(
                "timeline duration {} is not positive",
                timeline.duration
            )));
        }

        let mut graph = Self {
            inputs: Vec::new(),
            chains: Vec::new(),
            video_out: String::new(),
            audio_out: String::new(),
        };

        let res = timeline.resolution;
        let fps = request.encode.fps.max(1);
        let (top_height, bottom_height) = if timeline.is_stacked() {
            (res.half_height(), res.height - res.half_height())
        } else {
            (res.height, 0)
        };

        let with_original = timeline.audio.layer(AudioKind::Original).is_some();
        let primary = graph.add_track(&timeline.primary, "p", res.width, top_height, fps, with_original);

        let mut video = primary.video;
        if let Some(secondary) = &timeline.secondary {
            let bottom = graph.add_track(secondary, "s", res.width, bottom_height, fps, false);
            graph.chains.push(format!(
                "[{}][{}]vstack=inputs=2[stacked]",
                video, bottom.video
            ));
            video = "stacked".to_string();
        }

        if let Some(subtitles) = &request.subtitles {
            graph.chains.push(format!(
                "[{}]subtitles=filename={}[subbed]",
                video,
                escape_filter_path(subtitles)
            ));
            video = "subbed".to_string();
        }

        graph.video_out =
            graph.add_edge_transitions(video, &timeline.transitions, res, fps, timeline.duration);
        graph.audio_out = graph.add_audio(&timeline.audio, primary.audio, timeline.duration)?;

        Ok(graph)
    }

    /// Input argument groups, one per input file.
    pub fn inputs(&self) -> &[Vec<String>] {
        &self.inputs
    }

    /// The `-filter_complex` value.
    pub fn graph(&self) -> String {
        self.chains.join(";")
    }

    /// Label of the final video stream.
    pub fn video_label(&self) -> &str {
        &self.video_out
    }

    /// Label of the final audio stream.
    pub fn audio_label(&self) -> &str {
        &self.audio_out
    }

    /// Complete ffmpeg argument list.
    pub fn ffmpeg_args(&self, encode: &OutputSettings, duration: f64, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec!["-hide_banner".into(), "-y".into()];
        for input in &self.inputs {
            args.extend(input.iter().cloned());
        }
        args.extend([
            "-filter_complex".to_string(),
            self.graph(),
            "-map".to_string(),
            format!("[{}]", self.video_out),
            "-map".to_string(),
            format!("[{}]", self.audio_out),
            "-r".to_string(),
            encode.fps.to_string(),
            "-c:v".to_string(),
            encode.video_codec.clone(),
            "-preset".to_string(),
            encode.preset.clone(),
            "-crf".to_string(),
            encode.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-threads".to_string(),
            encode.threads.to_string(),
            "-c:a".to_string(),
            encode.audio_codec.clone(),
            "-t".to_string(),
            secs(duration),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.to_string_lossy().to_string(),
        ]);
        args
    }

    fn add_input(&mut self, args: Vec<String>) -> usize {
        self.inputs.push(args);
        self.inputs.len() - 1
    }

    fn add_media_input(&mut self, item: &MediaItem, fps: u32) -> usize {
        let path = item.path.to_string_lossy().to_string();
        if item.is_image() {
            self.add_input(vec![
                "-loop".into(),
                "1".into(),
                "-framerate".into(),
                fps.to_string(),
                "-t".into(),
                secs(item.duration),
                "-i".into(),
                path,
            ])
        } else {
            self.add_input(vec!["-i".into(), path])
        }
    }

    fn add_track(
        &mut self,
        fitted: &FittedTrack,
        prefix: &str,
        width: u32,
        height: u32,
        fps: u32,
        with_audio: bool,
    ) -> TrackLabels {
        let track = &fitted.track;
        let mut video_parts = Vec::with_capacity(track.len());
        let mut audio_parts = Vec::with_capacity(track.len());

        for (i, entry) in track.entries.iter().enumerate() {
            let input = self.add_media_input(&entry.item, fps);
            let d = secs(entry.item.duration);

            let v = format!("{}v{}", prefix, i);
            self.chains.push(format!(
                "[{input}:v]scale={width}:{height}:force_original_aspect_ratio=increase,\
                 crop={width}:{height},setsar=1,fps={fps},format=yuv420p,\
                 trim=duration={d},setpts=PTS-STARTPTS,settb=AVTB[{v}]"
            ));
            video_parts.push(v);

            if with_audio {
                let a = format!("{}a{}", prefix, i);
                if entry.item.has_audio && !entry.item.is_image() {
                    self.chains.push(format!(
                        "[{input}:a]{AUDIO_FORMAT},atrim=duration={d},asetpts=PTS-STARTPTS[{a}]"
                    ));
                } else {
                    self.chains.push(format!(
                        "anullsrc=r=44100:cl=stereo,atrim=duration={d}[{a}]"
                    ));
                }
                audio_parts.push(a);
            }
        }

        let mut video = video_parts[0].clone();
        let mut audio = audio_parts.first().cloned();

        for (i, entry) in track.entries.iter().enumerate().skip(1) {
            let blend = entry
                .transition_in
                .filter(|t| t.duration > 0.0 && !t.kind.is_none());

            let joined = format!("{}j{}", prefix, i);
            match blend {
                Some(t) => self.chains.push(format!(
                    "[{}][{}]xfade=transition={}:duration={}:offset={}[{}]",
                    video,
                    video_parts[i],
                    xfade_name(t.kind),
                    secs(t.duration),
                    secs(entry.start),
                    joined
                )),
                None => self.chains.push(format!(
                    "[{}][{}]concat=n=2:v=1:a=0[{}]",
                    video, video_parts[i], joined
                )),
            }
            video = joined;

            if let Some(acc) = audio.take() {
                let joined = format!("{}k{}", prefix, i);
                match blend {
                    Some(t) => self.chains.push(format!(
                        "[{}][{}]acrossfade=d={}[{}]",
                        acc,
                        audio_parts[i],
                        secs(t.duration),
                        joined
                    )),
                    None => self.chains.push(format!(
                        "[{}][{}]concat=n=2:v=0:a=1[{}]",
                        acc, audio_parts[i], joined
                    )),
                }
                audio = Some(joined);
            }
        }

        let total = secs(fitted.duration);
        let video_out = format!("{}out", prefix);
        if fitted.loops > 1 {
            let copies: Vec<String> = (0..fitted.loops).map(|k| format!("{}r{}", prefix, k)).collect();
            self.chains.push(format!("[{}]split={}{}", video, fitted.loops, labels(&copies)));
            self.chains.push(format!(
                "{}concat=n={}:v=1:a=0,trim=duration={},setpts=PTS-STARTPTS[{}]",
                labels(&copies),
                fitted.loops,
                total,
                video_out
            ));
        } else {
            self.chains.push(format!(
                "[{}]trim=duration={},setpts=PTS-STARTPTS[{}]",
                video, total, video_out
            ));
        }

        let audio_out = audio.map(|acc| {
            let out = format!("{}aout", prefix);
            if fitted.loops > 1 {
                let copies: Vec<String> =
                    (0..fitted.loops).map(|k| format!("{}ar{}", prefix, k)).collect();
                self.chains.push(format!("[{}]asplit={}{}", acc, fitted.loops, labels(&copies)));
                self.chains.push(format!(
                    "{}concat=n={}:v=0:a=1,atrim=duration={},asetpts=PTS-STARTPTS[{}]",
                    labels(&copies),
                    fitted.loops,
                    total,
                    out
                ));
            } else {
                self.chains.push(format!(
                    "[{}]atrim=duration={},asetpts=PTS-STARTPTS[{}]",
                    acc, total, out
                ));
            }
            out
        });

        TrackLabels {
            video: video_out,
            audio: audio_out,
        }
    }

    fn add_edge_transitions(
        &mut self,
        video: String,
        edges: &AppliedTransitions,
        res: Resolution,
        fps: u32,
        duration: f64,
    ) -> String {
        let mut current = video;

        if edges.has_motion() {
            let mut source = current.clone();
            if let Some(factor) = zoom_expr(edges) {
                self.chains.push(format!(
                    "[{src}]scale=w='max(2,trunc({w}*{f}/2)*2)':h='max(2,trunc({h}*{f}/2)*2)':eval=frame[edge_zoom]",
                    src = source,
                    w = res.width,
                    h = res.height,
                    f = factor
                ));
                source = "edge_zoom".to_string();
            }

            let (x, y) = slide_exprs(edges, res);
            self.chains.push(format!(
                "color=c=black:s={}x{}:r={}:d={}[edge_bg]",
                res.width,
                res.height,
                fps,
                secs(duration)
            ));
            self.chains.push(format!(
                "[edge_bg][{}]overlay=x='(W-w)/2+{}':y='(H-h)/2+{}':eval=frame:shortest=1[edge_motion]",
                source, x, y
            ));
            current = "edge_motion".to_string();
        }

        let mut fades = Vec::new();
        if let Some(t) = edges.entrance.filter(|t| t.kind == TransitionKind::Fade) {
            fades.push(format!("fade=t=in:st=0:d={}", secs(t.duration)));
        }
        if let Some(t) = edges.exit.filter(|t| t.kind == TransitionKind::Fade) {
            fades.push(format!(
                "fade=t=out:st={}:d={}",
                secs(t.start),
                secs(t.duration)
            ));
        }
        if !fades.is_empty() {
            self.chains
                .push(format!("[{}]{}[edge_fade]", current, fades.join(",")));
            current = "edge_fade".to_string();
        }

        current
    }

    fn add_audio(
        &mut self,
        audio: &CompositeAudio,
        original: Option<String>,
        duration: f64,
    ) -> ComposeResult<String> {
        let d = secs(duration);
        let out = "aout".to_string();

        if audio.is_silent() {
            self.chains
                .push(format!("anullsrc=r=44100:cl=stereo,atrim=duration={}[{}]", d, out));
            return Ok(out);
        }

        let mut gained = Vec::with_capacity(audio.layers.len());
        for (i, layer) in audio.layers.iter().enumerate() {
            let fitted = match layer.source.kind {
                AudioKind::Original => original.clone().ok_or_else(|| {
                    ComposeError::render("original audio requested but the primary track has no audio")
                })?,
                AudioKind::Narration | AudioKind::Music => {
                    let path = layer.source.path.as_ref().ok_or_else(|| {
                        ComposeError::render(format!("{:?} layer has no source file", layer.source.kind))
                    })?;
                    let mut args: Vec<String> = Vec::new();
                    if layer.fit == LayerFit::Loop {
                        args.extend(["-stream_loop".to_string(), "-1".to_string()]);
                    }
                    args.extend(["-i".to_string(), path.to_string_lossy().to_string()]);
                    let input = self.add_input(args);

                    let label = format!("src{}", i);
                    self.chains.push(format!(
                        "[{}:a]{},apad,atrim=duration={},asetpts=PTS-STARTPTS[{}]",
                        input, AUDIO_FORMAT, d, label
                    ));
                    label
                }
            };

            let label = format!("mix{}", i);
            self.chains.push(format!(
                "[{}]{}[{}]",
                fitted,
                volume_filter(&layer.envelope),
                label
            ));
            gained.push(label);
        }

        if gained.len() == 1 {
            self.chains.push(format!("[{}]anull[{}]", gained[0], out));
        } else {
            self.chains.push(format!(
                "{}amix=inputs={}:duration=longest:dropout_transition=0:normalize=0,atrim=duration={}[{}]",
                labels(&gained),
                gained.len(),
                d,
                out
            ));
        }
        Ok(out)
    }
}

/// `RenderEngine` backed by the ffmpeg command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    runner: ToolRunner,
}

impl FfmpegRenderer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            runner: ToolRunner::new(ffmpeg_path),
        }
    }
}

impl Default for FfmpegRenderer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl RenderEngine for FfmpegRenderer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn render(&self, request: &RenderRequest) -> ComposeResult<RenderOutput> {
        let graph = FilterGraph::build(request)?;
        let args = graph.ffmpeg_args(&request.encode, request.timeline.duration, &request.output);
        let command = self.runner.command_line(&args);
        tracing::debug!("Render command: {}", command);

        if let Some(parent) = request.output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ComposeError::io("creating output directory", e))?;
            }
        }

        let output = self.runner.run(&args)?;
        if !output.success() {
            let message = format!(
                "{} exited with code {}: {}",
                self.runner.program(),
                output.exit_code,
                output.stderr_tail()
            );
            let edges = &request.timeline.transitions;
            if edges.has_motion() {
                return Err(ComposeError::TransitionRender {
                    kind: motion_kinds(edges),
                    message,
                });
            }
            return Err(ComposeError::render(message));
        }

        Ok(RenderOutput {
            output_path: request.output.clone(),
            command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputSettings, SubtitleSettings};
    use crate::models::{
        AudioSource, DuckWindow, GainSegment, GoverningMode, MixLayer, Timeline, TrackSlot,
        TransitionSpec,
    };
    use crate::sequencer::Sequencer;
    use std::path::PathBuf;

    fn fitted(items: Vec<MediaItem>, transition: TransitionSpec, governing: f64) -> FittedTrack {
        let sequencer = Sequencer::new(transition);
        let track = sequencer.build(TrackSlot::Primary, items).unwrap();
        sequencer.fit(track, governing).unwrap()
    }

    fn timeline(primary: FittedTrack, duration: f64) -> Timeline {
        Timeline {
            duration,
            mode: GoverningMode::UseNarrationLength,
            resolution: Resolution::default(),
            primary,
            secondary: None,
            phrases: Vec::new(),
            narration: None,
            audio: CompositeAudio::silent(duration),
            transitions: AppliedTransitions::default(),
        }
    }

    fn request(timeline: Timeline) -> RenderRequest {
        RenderRequest {
            timeline,
            output: PathBuf::from("/out/short.mp4"),
            subtitles: None,
            encode: OutputSettings::default(),
            subtitle_style: SubtitleSettings::default(),
        }
    }

    fn clip(name: &str, duration: f64) -> MediaItem {
        MediaItem::video(format!("/m/{}", name), duration, 1920, 1080, true)
    }

    #[test]
    fn short_track_is_looped_then_trimmed() {
        let primary = fitted(vec![clip("a.mp4", 8.0)], TransitionSpec::none(), 20.0);
        let graph = FilterGraph::build(&request(timeline(primary, 20.0))).unwrap();
        let text = graph.graph();

        assert!(text.contains("scale=1080:1920:force_original_aspect_ratio=increase"));
        assert!(text.contains("[pv0]split=3[pr0][pr1][pr2]"));
        assert!(text.contains("concat=n=3:v=1:a=0,trim=duration=20.000000"));
        assert!(text.contains("anullsrc=r=44100:cl=stereo,atrim=duration=20.000000[aout]"));
        assert_eq!(graph.video_label(), "pout");
        assert_eq!(graph.audio_label(), "aout");
    }

    #[test]
    fn images_are_looped_inputs() {
        let items = vec![
            MediaItem::image("/m/a.png", 5.0, 1000, 1000),
            MediaItem::image("/m/b.png", 5.0, 1000, 1000),
        ];
        let primary = fitted(items, TransitionSpec::none(), 12.0);
        let graph = FilterGraph::build(&request(timeline(primary, 12.0))).unwrap();

        let first = &graph.inputs()[0];
        assert_eq!(first[0], "-loop");
        assert!(first.contains(&"6.000000".to_string()));
        assert!(graph.graph().contains("[pv0][pv1]concat=n=2:v=1:a=0[pj1]"));
    }

    #[test]
    fn respread_images_keep_the_track_length() {
        let items = (0..3)
            .map(|i| MediaItem::image(format!("/m/{}.png", i), 5.0, 1000, 1000))
            .collect();
        let primary = fitted(items, TransitionSpec::none(), 10.0);
        let graph = FilterGraph::build(&request(timeline(primary, 10.0))).unwrap();

        let total: f64 = graph
            .inputs()
            .iter()
            .map(|input| {
                let t = input.iter().position(|a| a == "-t").unwrap();
                input[t + 1].parse::<f64>().unwrap()
            })
            .sum();
        assert!((total - 10.0).abs() < 1e-5, "items sum to {}", total);
        assert!(graph.graph().contains("trim=duration=3.333333,"));
    }

    #[test]
    fn crossfades_use_xfade_offsets() {
        let items = vec![clip("a.mp4", 6.0), clip("b.mp4", 6.0)];
        let primary = fitted(items, TransitionSpec::new(TransitionKind::Fade, 1.0), 11.0);
        let graph = FilterGraph::build(&request(timeline(primary, 11.0))).unwrap();
        assert!(graph
            .graph()
            .contains("xfade=transition=fade:duration=1.000000:offset=5.000000[pj1]"));
    }

    #[test]
    fn stacked_tracks_split_height() {
        let mut tl = timeline(fitted(vec![clip("a.mp4", 10.0)], TransitionSpec::none(), 10.0), 10.0);
        tl.secondary = Some(fitted(vec![clip("b.mp4", 10.0)], TransitionSpec::none(), 10.0));
        let graph = FilterGraph::build(&request(tl)).unwrap();
        let text = graph.graph();
        assert!(text.contains("scale=1080:960:"));
        assert!(text.contains("[pout][sout]vstack=inputs=2[stacked]"));
    }

    #[test]
    fn edge_fades_and_motion() {
        let mut tl = timeline(fitted(vec![clip("a.mp4", 10.0)], TransitionSpec::none(), 10.0), 10.0);
        tl.transitions = AppliedTransitions {
            entrance: Some(ClampedTransition {
                kind: TransitionKind::SlideLeft,
                start: 0.0,
                duration: 1.0,
            }),
            exit: Some(ClampedTransition {
                kind: TransitionKind::Fade,
                start: 9.0,
                duration: 1.0,
            }),
        };
        let graph = FilterGraph::build(&request(tl)).unwrap();
        let text = graph.graph();
        assert!(text.contains("overlay=x='(W-w)/2+if(lt(t,1.000000),1080*(1-(t/1.000000)),0)'"));
        assert!(text.contains("fade=t=out:st=9.000000:d=1.000000"));
        assert!(!text.contains("edge_zoom"));
        assert_eq!(graph.video_label(), "edge_fade");
    }

    #[test]
    fn zoom_uses_frame_scaling() {
        let edges = AppliedTransitions {
            entrance: Some(ClampedTransition {
                kind: TransitionKind::ZoomIn,
                start: 0.0,
                duration: 2.0,
            }),
            exit: None,
        };
        assert_eq!(
            zoom_expr(&edges).unwrap(),
            "max(0.01,if(lt(t,2.000000),(t/2.000000),1))"
        );
        assert_eq!(motion_kinds(&edges), "zoom-in");
    }

    #[test]
    fn ducked_music_gets_volume_expression() {
        let mut tl = timeline(fitted(vec![clip("a.mp4", 30.0)], TransitionSpec::none(), 30.0), 30.0);
        tl.audio = CompositeAudio {
            duration: 30.0,
            layers: vec![MixLayer {
                source: AudioSource::new(
                    AudioKind::Music,
                    Some(PathBuf::from("/m/song.mp3")),
                    12.0,
                    1.0,
                ),
                offset: 0.0,
                fit: LayerFit::Loop,
                duck: Some(DuckWindow {
                    start: 0.0,
                    end: 6.0,
                    factor: 0.5,
                }),
                envelope: GainEnvelope {
                    segments: vec![
                        GainSegment {
                            start: 0.0,
                            end: 6.0,
                            gain: 0.5,
                        },
                        GainSegment {
                            start: 6.0,
                            end: 30.0,
                            gain: 1.0,
                        },
                    ],
                },
                duration: 30.0,
            }],
        };

        let graph = FilterGraph::build(&request(tl)).unwrap();
        let text = graph.graph();
        assert!(text.contains("volume='if(lt(t,6.000000),0.5000,1.0000)':eval=frame"));
        assert!(text.contains("[mix0]anull[aout]"));
        let music_input = graph.inputs().last().unwrap();
        assert_eq!(&music_input[..2], &["-stream_loop".to_string(), "-1".to_string()]);
    }

    #[test]
    fn original_audio_follows_track_structure() {
        let mut tl = timeline(fitted(vec![clip("a.mp4", 8.0)], TransitionSpec::none(), 20.0), 20.0);
        tl.audio = CompositeAudio {
            duration: 20.0,
            layers: vec![MixLayer {
                source: AudioSource::new(AudioKind::Original, None, 20.0, 0.8),
                offset: 0.0,
                fit: LayerFit::Loop,
                duck: None,
                envelope: GainEnvelope::constant(0.8, 20.0),
                duration: 20.0,
            }],
        };
        let graph = FilterGraph::build(&request(tl)).unwrap();
        let text = graph.graph();
        assert!(text.contains("[0:a]aformat"));
        assert!(text.contains("[pa0]asplit=3"));
        assert!(text.contains("[paout]volume=0.8000[mix0]"));
    }

    #[test]
    fn subtitles_are_burned_with_escaped_path() {
        let tl = timeline(fitted(vec![clip("a.mp4", 5.0)], TransitionSpec::none(), 5.0), 5.0);
        let mut req = request(tl);
        req.subtitles = Some(PathBuf::from("/tmp/run:1/subs.ass"));
        let graph = FilterGraph::build(&req).unwrap();
        assert!(graph
            .graph()
            .contains("subtitles=filename=/tmp/run\\:1/subs.ass[subbed]"));
    }

    #[test]
    fn args_map_final_labels() {
        let tl = timeline(fitted(vec![clip("a.mp4", 5.0)], TransitionSpec::none(), 5.0), 5.0);
        let req = request(tl);
        let graph = FilterGraph::build(&req).unwrap();
        let args = graph.ffmpeg_args(&req.encode, 5.0, &req.output);
        let joined = args.join(" ");
        assert!(joined.contains("-map [pout] -map [aout]"));
        assert!(joined.contains("-c:v libx264 -preset fast -crf 23"));
        assert!(joined.ends_with("/out/short.mp4"));
    }

    #[test]
    fn zoom_out_maps_to_closing_circle() {
        assert_eq!(xfade_name(TransitionKind::ZoomOut), "circleclose");
        assert_eq!(xfade_name(TransitionKind::SlideUp), "slideup");
    }
}
