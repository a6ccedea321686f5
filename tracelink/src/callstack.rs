//! Pluggable call-stack capture
//!
//! Which stack sources exist is a host-runtime integration detail (native
//! frames, interpreter frames, ...), so capture is modeled as an ordered
//! list of strategies tried until one yields a non-empty rendering.

/// One way of capturing the calling thread's stack as rendered text.
pub trait StackCapture: Send + Sync {
    /// Short label for diagnostics ("native", "interpreter", ...).
    fn name(&self) -> &'static str;

    /// Capture the current stack, or `None` when this source has nothing.
    fn capture(&self) -> Option<String>;
}

/// Ordered fallback chain over [`StackCapture`] sources.
///
/// The first source producing a non-empty string wins; empty yields are
/// treated the same as `None` so a source that "succeeds" vacuously does not
/// mask a later one that has real frames.
#[derive(Default)]
pub struct CaptureChain {
    sources: Vec<Box<dyn StackCapture>>,
}

impl CaptureChain {
    /// Chain that captures nothing; the default for sessions without
    /// call-stack recording.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(sources: Vec<Box<dyn StackCapture>>) -> Self {
        Self { sources }
    }

    /// Append a source at the end of the fallback order.
    pub fn push(&mut self, source: Box<dyn StackCapture>) {
        self.sources.push(source);
    }

    /// Try each source in order; first non-empty capture wins.
    #[must_use]
    pub fn capture(&self) -> Option<String> {
        self.sources.iter().find_map(|source| source.capture().filter(|s| !s.is_empty()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for CaptureChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("CaptureChain").field("sources", &names).finish()
    }
}
