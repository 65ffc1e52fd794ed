//! HTML report of tracks that could not be resolved or inserted.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::apple_music::WEB_ORIGIN;
use crate::models::{FailedTrack, FailureReason};
use crate::safety::validate_output_path;

/// Marker every report file name carries
pub const REPORT_SUFFIX: &str = "failed_tracks";

const STYLE: &str = "
        body { font-family: Arial, sans-serif; margin: 20px; }
        .track { border: 1px solid #ddd; padding: 15px; margin: 10px 0; border-radius: 5px; }
        .track:hover { background-color: #f5f5f5; }
        .search-link { color: #0066cc; text-decoration: none; margin-right: 15px; }
        .search-link:hover { text-decoration: underline; }
        .reason { color: #a00; font-size: 0.9em; }
        .alternative { margin-left: 20px; padding: 10px; background-color: #f8f8f8; }
";

/// `<dir>/<stem>_failed_tracks.html` next to the input file.
pub fn report_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("playlist");
    input.with_file_name(format!("{}_{}.html", stem, REPORT_SUFFIX))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn search_link(storefront: &str, term: &str) -> String {
    format!(
        "{}/{}/search?term={}",
        WEB_ORIGIN,
        storefront,
        urlencoding::encode(term)
    )
}

pub fn song_link(storefront: &str, song_id: &str) -> String {
    format!("{}/{}/song/{}", WEB_ORIGIN, storefront, urlencoding::encode(song_id))
}

/// Render the full report document.
pub fn render_report(failed: &[FailedTrack], storefront: &str, generated_at: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n    <meta charset=\"utf-8\">\n    \
<title>Failed Tracks Report</title>\n    <style>{}    </style>\n</head>\n<body>\n    \
<h1>Failed Tracks Report - {}</h1>\n    \
<p>The following tracks could not be transferred automatically. \
Use the search links to find them manually in Apple Music.</p>\n",
        STYLE,
        escape_html(generated_at)
    );

    for track in failed {
        render_track(&mut html, track, storefront);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_track(html: &mut String, track: &FailedTrack, storefront: &str) {
    let record = &track.record;
    let title_artist = search_link(storefront, &format!("{} {}", record.title, record.artist));
    let title_only = search_link(storefront, &record.title);

    let reason = match &track.reason {
        FailureReason::Unresolved { best_confidence } => {
            format!("No confident match (best confidence {:.2})", best_confidence)
        }
        FailureReason::InsertFailed { song_id, message } => {
            format!("Matched song {} but insertion failed: {}", song_id, message)
        }
    };

    let _ = write!(
        html,
        "    <div class=\"track\">\n        <h3>{}</h3>\n        \
<p>Artist: {}<br>\n        Album: {}<br>\n        ISRC: {}</p>\n        \
<p class=\"reason\">{}</p>\n        \
<a href=\"{}\" target=\"_blank\" class=\"search-link\">Search Title + Artist</a>\n        \
<a href=\"{}\" target=\"_blank\" class=\"search-link\">Search Title Only</a>\n",
        escape_html(&record.title),
        escape_html(&record.artist),
        escape_html(&record.album),
        escape_html(&record.isrc),
        escape_html(&reason),
        escape_html(&title_artist),
        escape_html(&title_only)
    );

    if !track.alternatives.is_empty() {
        html.push_str(
            "        <div class=\"alternative\"><p>Possible matches (below confidence threshold):</p><ul>\n",
        );
        for alt in &track.alternatives {
            let _ = writeln!(
                html,
                "            <li>{} by {} (Confidence: {:.2}) \
<a href=\"{}\" target=\"_blank\" class=\"search-link\">Open</a></li>",
                escape_html(&alt.title),
                escape_html(&alt.artist),
                alt.composite_score,
                escape_html(&song_link(storefront, &alt.catalog_id))
            );
        }
        html.push_str("        </ul></div>\n");
    }

    html.push_str("    </div>\n");
}

/// Write the report for `input` and return its path.
///
/// Refuses any path that does not carry the report marker or that equals
/// the input itself.
pub fn write_report(input: &Path, failed: &[FailedTrack], storefront: &str) -> Result<PathBuf> {
    let output = report_path(input);
    validate_output_path(&output, REPORT_SUFFIX, &[input])?;

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
    let html = render_report(failed, storefront, &generated_at);
    std::fs::write(&output, html)
        .with_context(|| format!("Failed to write report {}", output.display()))?;
    Ok(output)
}
