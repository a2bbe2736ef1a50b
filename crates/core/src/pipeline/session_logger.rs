use std::collections::BTreeMap;
use std::time::Instant;

use crate::pipeline::frame_report::FrameReport;

/// Observer for client session events, so the processing loop does not
/// depend on any particular output.
pub trait SessionLogger: Send {
    /// Called once per frame taken from the relay, skipped or not.
    fn frame(&mut self, report: &FrameReport);

    /// Wall time of one pipeline stage for the current frame.
    fn timing(&mut self, stage: &'static str, duration_ms: f64);

    fn info(&mut self, message: &str);

    /// End-of-session report. Default: no-op.
    fn summary(&self) {}
}

pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn frame(&mut self, _report: &FrameReport) {}
    fn timing(&mut self, _stage: &'static str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running totals over every [`FrameReport`] of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionTotals {
    pub frames: usize,
    pub skipped: usize,
    pub faces: usize,
    pub dispatched: usize,
    pub replies: usize,
    pub resolved: usize,
    /// Pending objects as of the latest non-skipped frame.
    pub pending: usize,
}

impl SessionTotals {
    pub fn add(&mut self, report: &FrameReport) {
        self.frames += 1;
        if report.skipped {
            self.skipped += 1;
            return;
        }
        self.faces += report.faces;
        self.dispatched += report.dispatched;
        self.replies += report.replies;
        self.resolved += report.resolved;
        self.pending = report.pending;
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct StageTiming {
    samples: usize,
    total_ms: f64,
    max_ms: f64,
}

/// Logs session progress through `log` and keeps the totals and stage
/// timings for the closing summary.
pub struct StdoutSessionLogger {
    report_every: usize,
    started: Instant,
    totals: SessionTotals,
    stages: BTreeMap<&'static str, StageTiming>,
}

impl StdoutSessionLogger {
    /// Logs a progress line every `report_every` frames.
    pub fn new(report_every: usize) -> Self {
        Self {
            report_every: report_every.max(1),
            started: Instant::now(),
            totals: SessionTotals::default(),
            stages: BTreeMap::new(),
        }
    }

    pub fn totals(&self) -> SessionTotals {
        self.totals
    }

    /// `None` until a frame has been seen.
    pub fn summary_string(&self) -> Option<String> {
        let t = self.totals;
        if t.frames == 0 {
            return None;
        }
        let secs = self.started.elapsed().as_secs_f64();
        let fps = if secs > 0.0 { t.frames as f64 / secs } else { 0.0 };
        let detected = t.frames - t.skipped;
        let faces_per_frame = if detected > 0 {
            t.faces as f64 / detected as f64
        } else {
            0.0
        };

        let mut lines = vec![
            format!(
                "Session over: {} frames in {secs:.1}s ({fps:.1} fps), {} without a detection reply",
                t.frames, t.skipped
            ),
            format!("  faces per detected frame: {faces_per_frame:.2}"),
            format!(
                "  identify requests: {}  replies: {}  identified: {}  still pending: {}",
                t.dispatched, t.replies, t.resolved, t.pending
            ),
        ];
        for (stage, timing) in &self.stages {
            let avg = timing.total_ms / timing.samples as f64;
            lines.push(format!(
                "  {stage:<18} avg {avg:6.1}ms  max {:6.1}ms",
                timing.max_ms
            ));
        }
        Some(lines.join("\n"))
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn frame(&mut self, report: &FrameReport) {
        self.totals.add(report);
        let t = self.totals;
        if t.frames % self.report_every == 0 {
            log::info!(
                "{} frames, {} identified, {} pending",
                t.frames,
                t.resolved,
                t.pending
            );
        }
    }

    fn timing(&mut self, stage: &'static str, duration_ms: f64) {
        let timing = self.stages.entry(stage).or_default();
        timing.samples += 1;
        timing.total_ms += duration_ms;
        timing.max_ms = timing.max_ms.max(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
