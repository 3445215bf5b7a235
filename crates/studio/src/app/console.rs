use std::collections::VecDeque;

use stage::Console;
use tracing::info;

pub(crate) const MAX_OUTPUT_LINES: usize = 256;

/// Console pane output, mirrored into the log.
#[derive(Debug, Default)]
pub(crate) struct LogConsole {
    output_lines: VecDeque<String>,
}

impl LogConsole {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn output_lines(&self) -> impl Iterator<Item = &str> {
        self.output_lines.iter().map(String::as_str)
    }
}

impl Console for LogConsole {
    fn clear(&mut self) {
        self.output_lines.clear();
    }

    fn write(&mut self, line: &str) {
        info!(line, "console");
        for part in line.lines() {
            if self.output_lines.len() == MAX_OUTPUT_LINES {
                self.output_lines.pop_front();
            }
            self.output_lines.push_back(part.to_string());
        }
    }
}
