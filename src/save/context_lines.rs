use crate::config::SaveConfig;

/// Patch context size. It grows by one line on every retried upload and
/// falls back to the default once it would exceed the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLines {
    current: usize,
    default: usize,
    max: usize,
}

impl ContextLines {
    pub fn new(default: usize, max: usize) -> Self {
        Self {
            current: default,
            default,
            max: max.max(default),
        }
    }

    pub fn from_config(config: &SaveConfig) -> Self {
        Self::new(config.default_context_lines, config.max_context_lines)
    }

    pub fn current(self) -> usize { self.current }

    #[must_use]
    pub fn advance(self) -> Self {
        let next = self.current + 1;
        Self {
            current: if next > self.max { self.default } else { next },
            ..self
        }
    }
}
