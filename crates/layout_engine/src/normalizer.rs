//! Line wrapping of a leaf node ("normalization")
//!
//! After an edit the lines of a node are rebalanced against the usable
//! content width:
//! 1. Pull-up: while the line above has room, whole words (single chars when
//!    the line above has no break opportunity) move up from the start of the
//!    following line. Lines emptied this way are dropped.
//! 2. Push-down: a line wider than the content width sheds trailing content.
//!    Overflow beyond `wrap_threshold_factor` times the width moves whole
//!    words, smaller overflow moves chars and then completes the partial
//!    word. The shed content is prepended to the next line, or to a new line.
//!    The pass repeats on the line that received content.
//!
//! Every step strictly shrinks the content left to place, so both passes
//! terminate. Widths always come from the measurer, never char counts.

use crate::Result;
use doc_model::{is_break_space, DocumentTree, Fragment, LineContent, LineId, NodeId};
use text_engine::{TextMeasurer, TextStyle};

/// What a normalization run changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOutcome {
    /// Fragments pulled up into a previous line
    pub pulled_up: usize,
    /// Lines that shed content into the following line
    pub pushed_down: usize,
    pub lines_created: usize,
    pub lines_removed: usize,
}

impl NormalizeOutcome {
    pub fn changed_line_count(&self) -> bool {
        self.lines_created != self.lines_removed
    }

    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }

    fn absorb(&mut self, other: NormalizeOutcome) {
        self.pulled_up += other.pulled_up;
        self.pushed_down += other.pushed_down;
        self.lines_created += other.lines_created;
        self.lines_removed += other.lines_removed;
    }
}

/// Re-wraps the lines of one node
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    measurer: &'a dyn TextMeasurer,
    max_width: f32,
    threshold_factor: f32,
}

impl<'a> Normalizer<'a> {
    pub fn new(measurer: &'a dyn TextMeasurer, max_width: f32, threshold_factor: f32) -> Self {
        Self {
            measurer,
            max_width,
            threshold_factor,
        }
    }

    /// Normalizer for the page width and threshold of a tree's settings
    pub fn for_tree(measurer: &'a dyn TextMeasurer, tree: &DocumentTree) -> Self {
        let settings = tree.settings();
        Self::new(
            measurer,
            settings.page.content_width(),
            settings.document.wrap_threshold_factor,
        )
    }

    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    /// Rebalance `node` after an edit of the line at `line_index`
    pub fn normalize(&self, tree: &mut DocumentTree, node: NodeId, line_index: usize) -> Result<NormalizeOutcome> {
        let mut outcome = self.pull_up(tree, node, line_index, false)?;
        let count = tree.lines_of(node)?.len();
        let start = line_index.min(count.saturating_sub(1));
        outcome.absorb(self.push_down(tree, node, start, false)?);
        tracing::trace!(node = %node, line_index, ?outcome, "normalized node");
        Ok(outcome)
    }

    /// Rewrap every line of `node`, used when the width or style changed
    pub fn reflow(&self, tree: &mut DocumentTree, node: NodeId) -> Result<NormalizeOutcome> {
        let mut outcome = self.push_down(tree, node, 0, true)?;
        outcome.absorb(self.pull_up(tree, node, 0, true)?);
        Ok(outcome)
    }

    fn pull_up(&self, tree: &mut DocumentTree, node: NodeId, from: usize, exhaustive: bool) -> Result<NormalizeOutcome> {
        let mut outcome = NormalizeOutcome::default();
        let style = tree.text_style(node);
        let mut i = from.max(1);
        loop {
            let lines = tree.lines_of(node)?;
            if i >= lines.len() {
                break;
            }
            let (above, current) = (lines[i - 1], lines[i]);
            let pulled = self.pull_into_previous(tree, above, current, &style)?;
            outcome.pulled_up += pulled;

            let current_empty = tree.line(current).is_some_and(|l| l.is_empty());
            if current_empty {
                tree.remove_line(current)?;
                outcome.lines_removed += 1;
                continue;
            }
            if pulled == 0 && i > from && !exhaustive {
                break;
            }
            i += 1;
        }
        Ok(outcome)
    }

    /// Move leading content of `current` to the end of `above` while it fits
    fn pull_into_previous(&self, tree: &mut DocumentTree, above: LineId, current: LineId, style: &TextStyle) -> Result<usize> {
        let mut pulled = 0;
        loop {
            let (above_content, current_content) = match (tree.line(above), tree.line(current)) {
                (Some(a), Some(c)) => (a.content(), c.content()),
                _ => break,
            };
            if current_content.is_empty() {
                break;
            }
            let take = if above_content.has_whitespace() {
                current_content.first_word_end()
            } else {
                1
            };
            // Measure the joined storage: a pulled space may turn into a
            // printable no-break space.
            let candidate = Fragment::from_text(current_content.copy(0, take)?);
            let mut joined = above_content.clone();
            joined.append_fragment(&candidate);
            if joined.width(self.measurer, style, true) > self.max_width {
                break;
            }

            let fragment = tree.line_content_mut(current)?.cut_fragment(0, take)?;
            tree.line_content_mut(above)?.append_fragment(&fragment);
            pulled += 1;
        }
        Ok(pulled)
    }

    fn push_down(&self, tree: &mut DocumentTree, node: NodeId, start: usize, exhaustive: bool) -> Result<NormalizeOutcome> {
        let mut outcome = NormalizeOutcome::default();
        let style = tree.text_style(node);
        let mut i = start;
        loop {
            let lines = tree.lines_of(node)?;
            let Some(&line) = lines.get(i) else {
                break;
            };
            let next = lines.get(i + 1).copied();

            let shed = self.shed_overflow(tree.line_content_mut(line)?, &style);
            match shed {
                Some(fragment) => {
                    outcome.pushed_down += 1;
                    match next {
                        Some(next) => tree.line_content_mut(next)?.prepend_fragment(&fragment),
                        None => {
                            let mut content = LineContent::new();
                            content.append_fragment(&fragment);
                            tree.insert_line(node, i + 1, content)?;
                            outcome.lines_created += 1;
                        }
                    }
                }
                None if !exhaustive => break,
                None => {}
            }
            i += 1;
        }
        Ok(outcome)
    }

    /// Cut the trailing content that makes `content` too wide
    fn shed_overflow(&self, content: &mut LineContent, style: &TextStyle) -> Option<Fragment> {
        let initial = content.width(self.measurer, style, true);
        if initial <= self.max_width {
            return None;
        }
        let mut shed = Fragment::default();
        let mut width = initial;

        if initial > self.threshold_factor * self.max_width {
            while width > self.max_width && content.last_word_start() > 0 {
                shed = join(content.pop_last_word(), shed);
                width = content.width(self.measurer, style, true);
            }
        }

        let mut popped_chars = false;
        while width > self.max_width && content.len() > 1 {
            match content.pop() {
                Some(ch) => shed = join(ch, shed),
                None => break,
            }
            popped_chars = true;
            width = content.width(self.measurer, style, true);
        }

        if popped_chars && content.has_whitespace() {
            let ends_in_word = content.raw().chars().last().is_some_and(|c| !is_break_space(c));
            let shed_starts_word = shed.text.chars().next().is_some_and(|c| !is_break_space(c));
            let word_start = content.last_word_start();
            if ends_in_word && shed_starts_word && word_start > 0 {
                let len = content.len();
                if let Ok(partial) = content.cut_fragment(word_start, len) {
                    shed = join(partial, shed);
                }
            }
        }

        tracing::trace!(width = initial, max = self.max_width, shed = %shed.text, "line overflow");
        (!shed.is_empty()).then_some(shed)
    }
}

/// Concatenate two fragments, shifting the annotations of the second
fn join(mut first: Fragment, second: Fragment) -> Fragment {
    let offset = first.len();
    first.text.push_str(&second.text);
    first.annotations.extend(second.annotations.into_iter().map(|mut a| {
        a.start += offset;
        a.end += offset;
        a
    }));
    first
}
