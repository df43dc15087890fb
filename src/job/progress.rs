use std::fmt;

/// Percent reached when the document is loaded
pub const LOADED_PERCENT: u8 = 10;
/// Percent reached when every image has been processed
pub const IMAGES_DONE_PERCENT: u8 = 80;
pub const METADATA_PERCENT: u8 = 85;
pub const SAVING_PERCENT: u8 = 95;

/// Phase of a compression job
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Images,
    Metadata,
    Saving,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Loading => "Reading PDF",
            Stage::Images => "Recompressing images",
            Stage::Metadata => "Removing metadata",
            Stage::Saving => "Writing PDF",
            Stage::Done => "Done",
        };
        f.write_str(label)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    /// 0-100
    pub percent: u8,
}

impl Progress {
    pub fn new(stage: Stage, percent: u8) -> Self {
        Self {
            stage,
            percent: percent.min(100),
        }
    }

    /// Progress after `done` of `total` images, spread over the image band
    pub fn images(done: usize, total: usize) -> Self {
        let band = (IMAGES_DONE_PERCENT - LOADED_PERCENT) as usize;
        let step = if total == 0 {
            band
        } else {
            done.min(total) * band / total
        };
        Self::new(Stage::Images, LOADED_PERCENT + step as u8)
    }
}

/// Forwards progress to a callback, dropping repeats and regressions.
///
/// Image counts map onto a narrow percent band, so many consecutive updates
/// land on the same value; only strictly increasing percentages go through.
pub struct ProgressTracker<'a> {
    callback: Box<dyn FnMut(Progress) + 'a>,
    last: Option<u8>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(callback: impl FnMut(Progress) + 'a) -> Self {
        Self {
            callback: Box::new(callback),
            last: None,
        }
    }

    /// A tracker that discards every update
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    pub fn report(&mut self, progress: Progress) {
        if self.last.is_some_and(|last| progress.percent <= last) {
            return;
        }
        self.last = Some(progress.percent);
        (self.callback)(progress);
    }

    /// Last percentage forwarded
    pub fn last_percent(&self) -> Option<u8> {
        self.last
    }
}

impl fmt::Debug for ProgressTracker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("last", &self.last)
            .finish()
    }
}
