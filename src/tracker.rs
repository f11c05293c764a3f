//! The per-frame loop: capture, detect, classify, draw, print, display.
//!
//! Single-threaded and blocking. `GazeTracker::run` consumes the tracker,
//! so the frame source and the detector are dropped exactly once whichever
//! way the loop ends, errors included.

use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use tracing::{debug, info};

use crate::camera::FrameSource;
use crate::direction::GazeReading;
use crate::output::FrameSink;
use crate::pipeline::{GazePipeline, LandmarkDetector};
use crate::render::Overlay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    EndOfStream,
    EscapePressed,
    WindowClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub exit: ExitReason,
    pub frames: u64,
    /// Frames with a face, classified or indeterminate.
    pub readings: u64,
    pub indeterminate: u64,
}

/// Writes one label per classified frame.
pub struct LabelPrinter<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> LabelPrinter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn print(&mut self, reading: &GazeReading) -> Result<()> {
        let label = reading.to_string();
        if !self.color {
            writeln!(self.out, "{}", label)?;
        } else if reading.direction().is_some() {
            writeln!(self.out, "{}", label.green())?;
        } else {
            writeln!(self.out, "{}", label.yellow())?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub struct GazeTracker<S, D, K, W>
where
    S: FrameSource,
    D: LandmarkDetector,
    K: FrameSink,
    W: Write,
{
    source: S,
    pipeline: GazePipeline<D>,
    sink: K,
    overlay: Overlay,
    printer: LabelPrinter<W>,
    mirror: bool,
}

impl<S, D, K, W> GazeTracker<S, D, K, W>
where
    S: FrameSource,
    D: LandmarkDetector,
    K: FrameSink,
    W: Write,
{
    pub fn new(source: S, pipeline: GazePipeline<D>, sink: K, overlay: Overlay, printer: LabelPrinter<W>) -> Self {
        Self {
            source,
            pipeline,
            sink,
            overlay,
            printer,
            mirror: false,
        }
    }

    /// Flip frames horizontally before analysis.
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn run(mut self) -> Result<RunSummary> {
        info!("Tracking with {}", self.pipeline.detector_name());
        let mut summary = RunSummary {
            exit: ExitReason::EndOfStream,
            frames: 0,
            readings: 0,
            indeterminate: 0,
        };

        summary.exit = loop {
            if !self.sink.is_open() {
                break ExitReason::WindowClosed;
            }

            let mut frame = match self.source.capture() {
                Ok(frame) => frame,
                Err(e) => {
                    info!("Frame source ended: {:#}", e);
                    break ExitReason::EndOfStream;
                }
            };
            if self.mirror {
                image::imageops::flip_horizontal_in_place(&mut frame);
            }
            summary.frames += 1;

            let analysis = self.pipeline.process(&frame)?;
            let (width, height) = (frame.width() as usize, frame.height() as usize);
            let mut display = frame.into_raw();

            match &analysis {
                Some(a) => {
                    summary.readings += 1;
                    if a.reading == GazeReading::Indeterminate {
                        summary.indeterminate += 1;
                    }
                    self.overlay.draw(&mut display, width, height, a);
                    self.printer.print(&a.reading)?;
                }
                None => debug!("No face in frame {}", summary.frames),
            }

            self.sink.show(&display, width, height)?;

            if self.sink.exit_requested() {
                break ExitReason::EscapePressed;
            }
        };

        info!(
            "Stopped ({:?}) after {} frames, {} readings",
            summary.exit, summary.frames, summary.readings
        );
        Ok(summary)
    }
}
