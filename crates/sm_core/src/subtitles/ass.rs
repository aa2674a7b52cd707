//! Styled ASS script for burning subtitles into the render.
//!
//! Each phrase produces two events: a box layer drawn with an opaque-box
//! border style, and the caption itself with its stroke. Both are centered on
//! the frame.

use std::path::Path;

use crate::config::SubtitleSettings;
use crate::error::{ComposeError, ComposeResult};
use crate::models::{Phrase, Resolution};

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Middle-center alignment (numpad layout).
const ALIGN_CENTER: u32 = 5;

/// Format seconds as an ASS timestamp (H:MM:SS.cc).
pub fn format_ass_time(seconds: f64) -> String {
    let cs = (seconds * 100.0).round().max(0.0) as u64;

    let centis = cs % 100;
    let total_secs = cs / 100;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{}:{:02}:{:02}.{:02}", hours, mins, secs, centis)
}

/// `&HAABBGGRR` from an `RRGGBB` hex string and an opacity in [0, 1].
///
/// Unparseable colors fall back to white.
pub fn ass_color(rgb: &str, opacity: f64) -> String {
    let hex = rgb.trim().trim_start_matches('#');
    let value = if hex.len() == 6 {
        u32::from_str_radix(hex, 16).unwrap_or(0xFFFFFF)
    } else {
        0xFFFFFF
    };
    let r = (value >> 16) & 0xFF;
    let g = (value >> 8) & 0xFF;
    let b = value & 0xFF;
    let alpha = ((1.0 - opacity.clamp(0.0, 1.0)) * 255.0).round() as u32;
    format!("&H{:02X}{:02X}{:02X}{:02X}", alpha, b, g, r)
}

/// Build the full ASS script for the phrases.
pub fn write_ass(phrases: &[Phrase], style: &SubtitleSettings, res: Resolution) -> String {
    let margin = res.width.saturating_sub(style.max_width) / 2;
    let bold = if style.bold { -1 } else { 0 };
    let text_color = ass_color(&style.text_color, 1.0);
    let stroke_color = ass_color(&style.stroke_color, 1.0);
    let box_color = ass_color("000000", style.box_opacity);
    let transparent = ass_color("000000", 0.0);

    let mut out = String::new();
    out.push_str("[Script Info]\n");
    out.push_str("ScriptType: v4.00+\n");
    out.push_str(&format!("PlayResX: {}\n", res.width));
    out.push_str(&format!("PlayResY: {}\n", res.height));
    out.push_str("WrapStyle: 0\n");
    out.push_str("ScaledBorderAndShadow: yes\n\n");

    out.push_str("[V4+ Styles]\n");
    out.push_str(STYLE_FORMAT);
    out.push('\n');
    out.push_str(&format!(
        "Style: Box,{font},{size},{transparent},{transparent},{box_color},{box_color},{bold},0,0,0,100,100,0,0,3,{pad},0,{align},{margin},{margin},0,1\n",
        font = style.font,
        size = style.font_size,
        pad = style.box_padding,
        align = ALIGN_CENTER,
    ));
    out.push_str(&format!(
        "Style: Caption,{font},{size},{text_color},{text_color},{stroke_color},{transparent},{bold},0,0,0,100,100,0,0,1,{stroke},0,{align},{margin},{margin},0,1\n\n",
        font = style.font,
        size = style.font_size,
        stroke = style.stroke_width,
        align = ALIGN_CENTER,
    ));

    out.push_str("[Events]\n");
    out.push_str(EVENT_FORMAT);
    out.push('\n');

    for phrase in phrases.iter().filter(|p| p.duration > 0.0) {
        let start = format_ass_time(phrase.start);
        let end = format_ass_time(phrase.end());
        let text = format!("{}{}", fade_tag(style.fade, phrase.duration), phrase.text);
        out.push_str(&format!("Dialogue: 0,{},{},Box,,0,0,0,,{}\n", start, end, text));
        out.push_str(&format!("Dialogue: 1,{},{},Caption,,0,0,0,,{}\n", start, end, text));
    }

    out
}

/// `{\fad(in,out)}` limited to half the phrase, or nothing.
fn fade_tag(fade: f64, duration: f64) -> String {
    let fade = fade.min(duration / 2.0);
    if fade <= 0.0 {
        return String::new();
    }
    let ms = (fade * 1000.0).round() as u64;
    format!("{{\\fad({},{})}}", ms, ms)
}

/// Write the ASS script to a file.
pub fn save_ass(
    path: &Path,
    phrases: &[Phrase],
    style: &SubtitleSettings,
    res: Resolution,
) -> ComposeResult<()> {
    std::fs::write(path, write_ass(phrases, style, res))
        .map_err(|e| ComposeError::io(format!("writing {}", path.display()), e))
}
