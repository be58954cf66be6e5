//! Landmark trace files: one JSON object per line, one line per frame.
//!
//! ```text
//! {"t_ms": 0, "width": 640, "height": 480, "landmarks": [[0.41, 0.37, -0.02], ...]}
//! ```
//!
//! Coordinates are unit-square, as the detector reports them. `z` is optional.

use anyhow::{bail, Context, Result};
use liveness_core::LandmarkPoint;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

/// A single recorded frame.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceFrame {
    /// Milliseconds since the start of the recording.
    pub t_ms: u64,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub landmarks: Vec<Vec<f64>>,
}

impl TraceFrame {
    /// Convert the coordinate arrays into landmark points.
    pub fn points(&self) -> Result<Vec<LandmarkPoint>> {
        self.landmarks
            .iter()
            .enumerate()
            .map(|(i, c)| match c.as_slice() {
                [x, y] => Ok(LandmarkPoint::new(*x, *y)),
                [x, y, z] => Ok(LandmarkPoint { x: *x, y: *y, z: *z }),
                _ => bail!("landmark {i} has {} coordinates, expected 2 or 3", c.len()),
            })
            .collect()
    }

    /// Capture time of this frame on a clock that started at `base`.
    pub fn at(&self, base: Instant) -> Instant {
        base + Duration::from_millis(self.t_ms)
    }
}

/// Read every frame of a trace file.
pub fn read_trace(path: &Path) -> Result<Vec<TraceFrame>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_trace(BufReader::new(file)).with_context(|| format!("in trace {}", path.display()))
}

/// Parse trace lines. Blank lines are ignored; timestamps must not go
/// backwards.
pub fn parse_trace(reader: impl BufRead) -> Result<Vec<TraceFrame>> {
    let mut frames: Vec<TraceFrame> = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", n + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: TraceFrame = serde_json::from_str(&line)
            .with_context(|| format!("line {}: malformed frame", n + 1))?;
        if let Some(prev) = frames.last() {
            if frame.t_ms < prev.t_ms {
                bail!(
                    "line {}: timestamp {} ms is earlier than {} ms",
                    n + 1,
                    frame.t_ms,
                    prev.t_ms
                );
            }
        }
        frames.push(frame);
    }
    Ok(frames)
}
