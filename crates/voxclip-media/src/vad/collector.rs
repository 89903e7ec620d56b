//! Hangover state machine turning frame decisions into voiced segments.
//!
//! # State Machine
//!
//! ```text
//!              > ratio of window is speech
//!              (flush window into run)
//!     ┌──────┐ ───────────────────────────► ┌───────────┐
//!     │ Idle │                              │ Triggered │
//!     └──────┘ ◄─────────────────────────── └───────────┘
//!              > ratio of window is non-speech
//!              (close run as a segment)
//! ```
//!
//! While triggered every frame joins the run, whatever its label.
//! Input ending in `Triggered` closes the run as a final segment.

use voxclip_models::VoiceSegment;

use super::frames::Frame;

/// One classified frame, without its samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMark {
    pub timestamp: f64,
    pub duration: f64,
    pub is_speech: bool,
}

impl FrameMark {
    pub fn new(frame: &Frame<'_>, is_speech: bool) -> Self {
        Self {
            timestamp: frame.timestamp,
            duration: frame.duration,
            is_speech,
        }
    }

    fn end(&self) -> f64 {
        self.timestamp + self.duration
    }
}

/// Fixed-capacity ring of the most recent frame marks.
///
/// Storage is allocated once; pushing into a full ring overwrites the oldest.
#[derive(Debug, Clone)]
pub struct HangoverWindow {
    slots: Vec<FrameMark>,
    capacity: usize,
    head: usize,
    len: usize,
    voiced: usize,
}

impl HangoverWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            len: 0,
            voiced: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn voiced(&self) -> usize {
        self.voiced
    }

    pub fn unvoiced(&self) -> usize {
        self.len - self.voiced
    }

    pub fn push(&mut self, mark: FrameMark) {
        if self.capacity == 0 {
            return;
        }

        let tail = (self.head + self.len) % self.capacity;
        if self.len == self.capacity {
            // Full: overwrite the oldest and advance the head.
            if self.slots[self.head].is_speech {
                self.voiced -= 1;
            }
            self.slots[self.head] = mark;
            self.head = (self.head + 1) % self.capacity;
        } else if tail < self.slots.len() {
            self.slots[tail] = mark;
            self.len += 1;
        } else {
            self.slots.push(mark);
            self.len += 1;
        }

        if mark.is_speech {
            self.voiced += 1;
        }
    }

    /// Oldest buffered mark.
    pub fn oldest(&self) -> Option<&FrameMark> {
        (self.len > 0).then(|| &self.slots[self.head])
    }

    /// Buffered marks, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &FrameMark> + '_ {
        (0..self.len).map(move |i| &self.slots[(self.head + i) % self.capacity])
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.voiced = 0;
    }
}

/// Collector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadState {
    Idle,
    Triggered,
}

/// The frames accumulated since the last trigger.
#[derive(Debug, Clone, Copy)]
struct VoicedRun {
    start: f64,
    end: f64,
    frames: usize,
}

impl VoicedRun {
    fn extend(&mut self, mark: &FrameMark) {
        self.end = mark.end();
        self.frames += 1;
    }

    fn close(self) -> VoiceSegment {
        VoiceSegment::new(self.start, self.end)
    }
}

/// Streaming hangover collector.
#[derive(Debug, Clone)]
pub struct VoiceCollector {
    window: HangoverWindow,
    threshold: f64,
    state: VadState,
    run: Option<VoicedRun>,
    segments: Vec<VoiceSegment>,
}

impl VoiceCollector {
    /// `window_frames` is the ring size; a transition needs strictly more
    /// than `ratio * window_frames` agreeing frames in the ring.
    pub fn new(window_frames: usize, ratio: f64) -> Self {
        Self {
            window: HangoverWindow::new(window_frames),
            threshold: ratio * window_frames as f64,
            state: VadState::Idle,
            run: None,
            segments: Vec::new(),
        }
    }

    pub fn state(&self) -> VadState {
        self.state
    }

    /// Frames accumulated in the current voiced run.
    pub fn run_frames(&self) -> usize {
        self.run.map(|r| r.frames).unwrap_or(0)
    }

    /// Feed one classified frame. Returns the segment it closed, if any.
    pub fn push(&mut self, mark: FrameMark) -> Option<VoiceSegment> {
        match self.state {
            VadState::Idle => {
                self.window.push(mark);
                if self.window.voiced() as f64 > self.threshold {
                    self.trigger();
                }
                None
            }
            VadState::Triggered => {
                if let Some(run) = self.run.as_mut() {
                    run.extend(&mark);
                }
                self.window.push(mark);
                if self.window.unvoiced() as f64 > self.threshold {
                    self.release()
                } else {
                    None
                }
            }
        }
    }

    /// Flush every buffered frame, voiced or not, into a new run.
    fn trigger(&mut self) {
        let run = {
            let mut marks = self.window.iter();
            marks.next().map(|first| {
                let mut run = VoicedRun {
                    start: first.timestamp,
                    end: first.end(),
                    frames: 1,
                };
                for mark in marks {
                    run.extend(mark);
                }
                run
            })
        };
        self.run = run;
        self.window.clear();
        self.state = VadState::Triggered;
    }

    fn release(&mut self) -> Option<VoiceSegment> {
        self.window.clear();
        self.state = VadState::Idle;
        let segment = self.run.take().map(VoicedRun::close);
        if let Some(segment) = segment {
            self.segments.push(segment);
        }
        segment
    }

    /// End of input: close a run still in progress and return all segments.
    pub fn finish(mut self) -> Vec<VoiceSegment> {
        if let Some(run) = self.run.take() {
            self.segments.push(run.close());
        }
        self.segments
    }
}
