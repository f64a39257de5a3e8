//! Typing accuracy state machine
//!
//! The matcher owns the player's input buffer for the current snippet and
//! scores it position-by-position against the target text. It never performs
//! side effects itself; callers act on the flags of each [`Evaluation`].

/// Width of the indent inserted by Tab when the target has none at the cursor
const DEFAULT_TAB_FILL: &str = "  ";

/// A keystroke delivered by the input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character (newline included)
    Char(char),
    /// Auto-indent to the target's whitespace at the cursor
    Tab,
    /// Remove the last buffered character
    Backspace,
}

/// Result of scoring an input buffer against a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Positions where input matches the target
    pub correct: usize,
    /// Positions where input differs from (or runs past) the target
    pub errors: usize,
    /// Length of the target text in characters
    pub total: usize,
}

impl Progress {
    /// Number of evaluated positions (equals the input length)
    pub fn evaluated(&self) -> usize {
        self.correct + self.errors
    }
}

/// Score `input` against `target` character by character.
///
/// Characters typed past the end of the target count as errors, so
/// `correct + errors` always equals the input length.
pub fn score(target: &[char], input: &[char]) -> Progress {
    let correct = input
        .iter()
        .enumerate()
        .filter(|(i, c)| target.get(*i) == Some(*c))
        .count();

    Progress {
        correct,
        errors: input.len() - correct,
        total: target.len(),
    }
}

/// Outcome of an accepted keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub progress: Progress,
    /// The error count rose compared to the previous evaluation
    pub new_error: bool,
    /// The buffer grew
    pub typed: bool,
    /// The error threshold was crossed for the first time on this snippet
    pub threshold_reached: bool,
    /// The buffer now equals the target exactly
    pub completed: bool,
}

/// Per-snippet typing state
#[derive(Debug, Clone)]
pub struct TextMatcher {
    target: Vec<char>,
    input: Vec<char>,
    errors: usize,
    threshold: usize,
    latched: bool,
    completed: bool,
}

impl TextMatcher {
    pub fn new(target: &str, threshold: usize) -> Self {
        Self {
            target: target.chars().collect(),
            input: Vec::new(),
            errors: 0,
            threshold,
            latched: false,
            completed: false,
        }
    }

    /// The strike latch is set; input is rejected until a new snippet loads
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Whether the next keystroke would be evaluated
    pub fn accepts_input(&self) -> bool {
        !self.latched && !self.completed
    }

    pub fn input(&self) -> String {
        self.input.iter().collect()
    }

    pub fn progress(&self) -> Progress {
        score(&self.target, &self.input)
    }

    /// Apply a keystroke. Returns `None` when the input is rejected.
    pub fn apply(&mut self, key: Key) -> Option<Evaluation> {
        if !self.accepts_input() {
            return None;
        }

        if key == Key::Backspace && self.input.is_empty() {
            return None;
        }

        let previous_len = self.input.len();
        match key {
            Key::Char(c) => self.input.push(c),
            Key::Tab => {
                let fill = self.tab_fill();
                self.input.extend(fill);
            }
            Key::Backspace => {
                self.input.pop();
            }
        }

        Some(self.evaluate(previous_len))
    }

    /// Whitespace the target holds at the cursor, or the default indent
    fn tab_fill(&self) -> Vec<char> {
        let run: Vec<char> = self
            .target
            .iter()
            .skip(self.input.len())
            .take_while(|c| **c == ' ' || **c == '\t')
            .copied()
            .collect();

        if run.is_empty() {
            DEFAULT_TAB_FILL.chars().collect()
        } else {
            run
        }
    }

    fn evaluate(&mut self, previous_len: usize) -> Evaluation {
        let progress = score(&self.target, &self.input);
        let new_error = progress.errors > self.errors;
        self.errors = progress.errors;

        let threshold_reached = !self.latched && progress.errors >= self.threshold;
        if threshold_reached {
            self.latched = true;
        }

        let completed = progress.errors == 0 && self.input == self.target;
        if completed {
            self.completed = true;
        }

        Evaluation {
            progress,
            new_error,
            typed: self.input.len() > previous_len,
            threshold_reached,
            completed,
        }
    }
}
