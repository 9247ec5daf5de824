//! Run progress as a monotonically increasing fraction.
//!
//! Scene compilation owns the first [`COMPILE_SHARE`] of the bar; the rest is reserved for
//! assembly, mixing and export. Only [`ProgressTracker::finish`] reports `1.0`.

pub const COMPILE_SHARE: f64 = 0.85;
const ASSEMBLE_END: f64 = 0.92;
const MIX_END: f64 = 0.95;
const EXPORT_CEILING: f64 = 0.99;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Assemble,
    Mix,
    Export,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Compile => "compile",
            Self::Assemble => "assemble",
            Self::Mix => "mix",
            Self::Export => "export",
            Self::Done => "done",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgressUpdate {
    pub fraction: f64,
    pub stage: Stage,
    pub message: String,
}

pub trait ProgressSink {
    fn report(&mut self, update: ProgressUpdate);
}

/// Discards every update.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _update: ProgressUpdate) {}
}

impl ProgressSink for Vec<ProgressUpdate> {
    fn report(&mut self, update: ProgressUpdate) {
        self.push(update);
    }
}

/// Maps stage-local progress onto the global bar and keeps it monotonic.
pub struct ProgressTracker<'a> {
    sink: &'a mut dyn ProgressSink,
    last: f64,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self { sink, last: 0.0 }
    }

    pub fn fraction(&self) -> f64 {
        self.last
    }

    /// `done` of `total` scenes have left the compiler, failed or not.
    pub fn scene_finished(&mut self, done: usize, total: usize, message: impl Into<String>) {
        let share = if total == 0 {
            1.0
        } else {
            done.min(total) as f64 / total as f64
        };
        self.emit(COMPILE_SHARE * share, Stage::Compile, message.into());
    }

    /// Mark the end of a post-compile stage.
    pub fn stage_finished(&mut self, stage: Stage) {
        let fraction = match stage {
            Stage::Compile => COMPILE_SHARE,
            Stage::Assemble => ASSEMBLE_END,
            Stage::Mix => MIX_END,
            Stage::Export | Stage::Done => EXPORT_CEILING,
        };
        self.emit(fraction, stage, format!("{stage} finished"));
    }

    /// The output file is in place.
    pub fn finish(&mut self, message: impl Into<String>) {
        self.last = 1.0;
        self.sink.report(ProgressUpdate {
            fraction: 1.0,
            stage: Stage::Done,
            message: message.into(),
        });
    }

    fn emit(&mut self, fraction: f64, stage: Stage, message: String) {
        let fraction = fraction.clamp(self.last, EXPORT_CEILING);
        self.last = fraction;
        self.sink.report(ProgressUpdate {
            fraction,
            stage,
            message,
        });
    }
}

#[cfg(test)]
#[path = "../tests/unit/progress.rs"]
mod tests;
