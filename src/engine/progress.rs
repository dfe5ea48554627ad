use std::collections::VecDeque;

use log::info;

/// Default number of lines kept for the host.
pub const PROGRESS_LINES: usize = 30;

/// Human-readable progress history, newest line first.
///
/// Every line is also forwarded to the `log` facade, so a headless run loses
/// nothing when the history rolls over.
#[derive(Clone, Debug)]
pub struct ProgressLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::with_capacity(PROGRESS_LINES)
    }
}

impl ProgressLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{line}");
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_back();
        }
        self.lines.push_front(line);
    }

    /// Newest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.lines.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_line_comes_first() {
        let mut log = ProgressLog::default();
        log.push("> Read 2 image");
        log.push("> things 10");
        assert_eq!(log.lines().collect::<Vec<_>>(), ["> things 10", "> Read 2 image"]);
        assert_eq!(log.latest(), Some("> things 10"));
    }

    #[test]
    fn history_is_bounded() {
        let mut log = ProgressLog::with_capacity(3);
        for i in 0..10 {
            log.push(format!("> Saved frame {i}"));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.lines().last(), Some("> Saved frame 7"));
    }
}
