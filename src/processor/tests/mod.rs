//! Pipeline tests for the batch merger
//!
//! Builds raw snapshot directories in temporary folders and runs the full
//! discover → normalize → combine → write flow against them.


use serde_json::{Value, json};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory sink for `tracing` output
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Plain-text subscriber writing into this capture
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let capture = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || capture.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Captured lines containing `needle`
    pub fn lines_containing(&self, needle: &str) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Write a snapshot body under `dir` with the given file name
pub fn write_snapshot(dir: &Path, name: &str, body: &Value) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(body).unwrap()).unwrap();
    path
}

/// A top-artists body with `(name, listeners)` entries ranked in order
pub fn artists_body(entries: &[(&str, &str)]) -> Value {
    let artists: Vec<Value> = entries
        .iter()
        .enumerate()
        .map(|(i, (name, listeners))| {
            json!({
                "name": name,
                "listeners": listeners,
                "mbid": "",
                "url": format!("https://www.last.fm/music/{}", name),
                "streamable": "0",
                "image": [{"#text": "", "size": "small"}],
                "@attr": {"rank": (i + 1).to_string()}
            })
        })
        .collect();
    json!({"topartists": {"artist": artists, "@attr": {"country": "Test"}}})
}

/// A top-tracks body with `(track, artist, listeners)` entries
pub fn tracks_body(entries: &[(&str, &str, &str)]) -> Value {
    let tracks: Vec<Value> = entries
        .iter()
        .enumerate()
        .map(|(i, (track, artist, listeners))| {
            json!({
                "name": track,
                "duration": "200",
                "listeners": listeners,
                "mbid": "",
                "url": "https://www.last.fm/music/track",
                "streamable": {"#text": "0", "fulltrack": "0"},
                "artist": {"name": artist, "mbid": "", "url": "https://www.last.fm/music/artist"},
                "image": [],
                "@attr": {"rank": i.to_string()}
            })
        })
        .collect();
    json!({"tracks": {"track": tracks}})
}
