use crate::WriteError;
use crate::state::Frame;

/// Progress of one in-flight write, owned by the caller between calls.
///
/// A fresh state starts a new write. After a call returns `Ok(false)` the
/// same state, resource and sink must be passed again to continue. Once the
/// write completes the state is idle and can be reused.
///
/// An internal-consistency failure poisons the state: every later call
/// returns [`WriteError::Poisoned`] until [`reset`](Self::reset) is called.
#[derive(Debug, Default)]
pub struct WriteState {
    frames: Vec<Frame>,
    poisoned: bool,
    #[cfg(feature = "debug")]
    failure_path: Option<String>,
}

impl WriteState {
    pub const fn new() -> Self {
        Self {
            frames: Vec::new(),
            poisoned: false,
            #[cfg(feature = "debug")]
            failure_path: None,
        }
    }

    /// Returns `true` if no write is in progress.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.frames.is_empty() && !self.poisoned
    }

    /// Returns the number of stored frames.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// The stored frames, outermost first.
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Discards all progress.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.poisoned = false;
        #[cfg(feature = "debug")]
        {
            self.failure_path = None;
        }
    }

    /// The frames from the root to the failing level, recorded when the state was poisoned.
    #[cfg(feature = "debug")]
    pub fn failure_path(&self) -> Option<&str> {
        self.failure_path.as_deref()
    }

    pub(crate) fn poison(&mut self, err: &WriteError) {
        let path = self.path();
        log::error!("write failed at `{path}`: {err}");
        #[cfg(feature = "debug")]
        {
            self.failure_path = Some(path);
        }
        self.frames.clear();
        self.poisoned = true;
    }

    fn path(&self) -> String {
        let mut path = String::new();
        for (index, frame) in self.frames.iter().enumerate() {
            if index > 0 {
                path.push_str(" -> ");
            }
            path.push_str(&frame.to_string());
        }
        path
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, depth: usize) -> Option<&mut Frame> {
        self.frames.get_mut(depth)
    }

    #[inline]
    pub(crate) fn get(&self, depth: usize) -> Option<&Frame> {
        self.frames.get(depth)
    }

    #[inline]
    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    #[inline]
    pub(crate) fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::AnnotationMask;
    use crate::state::{CollectionFrame, ResourceFrame};

    #[test]
    fn poison_and_reset() {
        let mut state = WriteState::new();
        assert!(state.is_idle());

        state.push(Frame::Resource(ResourceFrame::new("Order", AnnotationMask::empty())));
        state.push(Frame::Collection(CollectionFrame::default()));
        assert_eq!(state.depth(), 2);
        assert!(!state.is_idle());

        state.poison(&WriteError::MissingFrame(2));
        assert!(state.is_poisoned());
        assert_eq!(state.depth(), 0);
        #[cfg(feature = "debug")]
        assert_eq!(state.failure_path(), Some("Order -> [0]"));

        state.reset();
        assert!(state.is_idle());
    }
}
