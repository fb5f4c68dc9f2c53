//! Raw text storage of one visual line
//!
//! `LineContent` keeps the raw text exactly as stored and a whitespace
//! normalized projection that every length and offset refers to. Storage
//! never holds two adjacent collapsible whitespace characters: a space typed
//! or joined next to another one is stored as a no-break space, so the
//! projection keeps one char per stored char and no typed character is lost
//! to collapsing.

use crate::{Annotation, DocModelError, Result};
use text_engine::{TextMeasurer, TextStyle};

/// Stored in place of a collapsible space that would touch another one
pub const NO_BREAK_SPACE: char = '\u{00A0}';

/// Whitespace that collapses and offers a break opportunity
pub fn is_break_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

/// Collapse runs of collapsible whitespace to one space and render no-break
/// spaces as plain spaces.
pub fn normalize_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for ch in raw.chars() {
        if is_break_space(ch) {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            in_run = false;
            out.push(if ch == NO_BREAK_SPACE { ' ' } else { ch });
        }
    }
    out
}

/// Text cut out of a line, together with the annotations that covered it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// Raw text
    pub text: String,
    /// Annotations relative to the fragment start
    pub annotations: Vec<Annotation>,
}

impl Fragment {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            annotations: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Normalized text of the fragment
    pub fn normalized(&self) -> String {
        normalize_whitespace(&self.text)
    }
}

/// Geometry of a sub-range of a line, relative to the line's left edge
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContentInfo {
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

/// Text held by one line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineContent {
    raw: String,
    normalized: String,
    annotations: Vec<Annotation>,
}

impl LineContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let mut content = Self::new();
        content.append_fragment(&Fragment::from_text(text));
        content
    }

    /// Length in normalized chars
    pub fn len(&self) -> usize {
        self.normalized.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// User-visible text
    pub fn text(&self) -> &str {
        &self.normalized
    }

    /// Stored text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn add_annotation(&mut self, annotation: Annotation) -> Result<()> {
        self.check_range(annotation.start, annotation.end)?;
        if !annotation.is_empty() {
            self.annotations.push(annotation);
        }
        Ok(())
    }

    /// Whether the line offers any break opportunity
    pub fn has_whitespace(&self) -> bool {
        self.raw.chars().any(is_break_space)
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.raw.chars().nth(offset)
    }

    /// Insert a single char at `offset`
    pub fn insert_value(&mut self, ch: char, offset: usize) -> Result<()> {
        self.check_insert(offset)?;
        self.insert_value_unchecked(ch, offset);
        Ok(())
    }

    /// Insert `text` char by char at `offset`, returns the number of chars inserted
    pub fn insert_text(&mut self, text: &str, offset: usize) -> Result<usize> {
        self.check_insert(offset)?;
        Ok(self.insert_text_unchecked(text, offset))
    }

    /// Insert a fragment, keeping its annotations
    pub fn insert_fragment(&mut self, fragment: &Fragment, offset: usize) -> Result<()> {
        self.check_insert(offset)?;
        self.insert_fragment_unchecked(fragment, offset);
        Ok(())
    }

    pub fn append_fragment(&mut self, fragment: &Fragment) {
        let offset = self.len();
        self.insert_fragment_unchecked(fragment, offset);
    }

    pub fn prepend_fragment(&mut self, fragment: &Fragment) {
        self.insert_fragment_unchecked(fragment, 0);
    }

    /// Remove `[start, end)` and return it with its annotations
    pub fn cut_fragment(&mut self, start: usize, end: usize) -> Result<Fragment> {
        self.check_range(start, end)?;
        let fragment = self.copy_fragment(start, end);
        self.remove_unchecked(start, end);
        Ok(fragment)
    }

    /// Remove `[start, end)` and return its raw text
    pub fn cut(&mut self, start: usize, end: usize) -> Result<String> {
        Ok(self.cut_fragment(start, end)?.text)
    }

    /// Raw text of `[start, end)` without mutating
    pub fn copy(&self, start: usize, end: usize) -> Result<String> {
        self.check_range(start, end)?;
        Ok(self.copy_fragment(start, end).text)
    }

    /// Remove `[start, end)`
    pub fn remove_at(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_range(start, end)?;
        self.remove_unchecked(start, end);
        Ok(())
    }

    /// Remove the last char
    pub fn pop(&mut self) -> Option<Fragment> {
        let length = self.len();
        if length == 0 {
            return None;
        }
        self.cut_fragment(length - 1, length).ok()
    }

    /// Remove the first char
    pub fn pop_first_char(&mut self) -> Option<Fragment> {
        if self.is_empty() {
            return None;
        }
        self.cut_fragment(0, 1).ok()
    }

    /// Remove the trailing word together with the whitespace after it.
    ///
    /// When the line holds a single word the whole content is returned.
    pub fn pop_last_word(&mut self) -> Fragment {
        let start = self.last_word_start();
        let length = self.len();
        self.cut_fragment(start, length).unwrap_or_default()
    }

    /// Remove the leading word together with the whitespace around it
    pub fn pop_first_word(&mut self) -> Fragment {
        let end = self.first_word_end();
        self.cut_fragment(0, end).unwrap_or_default()
    }

    pub fn remove_first_word(&mut self) {
        let end = self.first_word_end();
        self.remove_unchecked(0, end);
    }

    /// Offset where the trailing word (including trailing whitespace) starts
    pub fn last_word_start(&self) -> usize {
        let chars: Vec<char> = self.raw.chars().collect();
        let mut j = chars.len();
        while j > 0 && is_break_space(chars[j - 1]) {
            j -= 1;
        }
        while j > 0 && !is_break_space(chars[j - 1]) {
            j -= 1;
        }
        j
    }

    /// Offset where the leading word (including surrounding whitespace) ends
    pub fn first_word_end(&self) -> usize {
        let chars: Vec<char> = self.raw.chars().collect();
        let mut i = 0;
        while i < chars.len() && is_break_space(chars[i]) {
            i += 1;
        }
        while i < chars.len() && !is_break_space(chars[i]) {
            i += 1;
        }
        while i < chars.len() && is_break_space(chars[i]) {
            i += 1;
        }
        i
    }

    /// Rendered width, optionally ignoring trailing collapsible whitespace
    pub fn width(&self, measurer: &dyn TextMeasurer, style: &TextStyle, only_printable: bool) -> f32 {
        let text = if only_printable {
            self.raw.trim_end_matches(is_break_space)
        } else {
            self.raw.as_str()
        };
        measurer.measure(text, style).width
    }

    /// Rendered height of the line box
    pub fn height(&self, measurer: &dyn TextMeasurer, style: &TextStyle) -> f32 {
        measurer.line_height(&self.raw, style)
    }

    /// Geometry of `[start, end)` relative to the line's left edge
    pub fn content_info_for_offset(
        &self,
        measurer: &dyn TextMeasurer,
        style: &TextStyle,
        start: usize,
        end: usize,
    ) -> Result<ContentInfo> {
        self.check_range(start, end)?;
        let left = measurer.advance_to(&self.raw, start, style);
        let right = measurer.advance_to(&self.raw, end, style);
        Ok(ContentInfo {
            left,
            width: right - left,
            height: self.height(measurer, style),
        })
    }

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        let length = self.len();
        if start > end || end > length {
            return Err(DocModelError::InvalidContentRange { start, end, length });
        }
        Ok(())
    }

    fn byte_index(&self, offset: usize) -> usize {
        self.raw
            .char_indices()
            .nth(offset)
            .map(|(idx, _)| idx)
            .unwrap_or(self.raw.len())
    }

    fn copy_fragment(&self, start: usize, end: usize) -> Fragment {
        let text = self.raw[self.byte_index(start)..self.byte_index(end)].to_string();
        let annotations = self
            .annotations
            .iter()
            .filter_map(|a| a.clip(start, end))
            .collect();
        Fragment { text, annotations }
    }

    fn check_insert(&self, offset: usize) -> Result<()> {
        let length = self.len();
        if offset > length {
            return Err(DocModelError::InvalidContentRange {
                start: offset,
                end: offset,
                length,
            });
        }
        Ok(())
    }

    /// `offset` must not exceed the length
    fn insert_value_unchecked(&mut self, ch: char, offset: usize) {
        let mut value = ch;
        if is_break_space(ch) {
            let before = offset.checked_sub(1).and_then(|i| self.char_at(i));
            let after = self.char_at(offset);
            let touches_space = before.is_some_and(is_break_space) || after.is_some_and(is_break_space);
            value = if touches_space { NO_BREAK_SPACE } else { ' ' };
        }

        let idx = self.byte_index(offset);
        self.raw.insert(idx, value);
        for annotation in &mut self.annotations {
            annotation.shift_for_insert(offset, 1);
        }
        self.resync();
    }

    fn insert_text_unchecked(&mut self, text: &str, offset: usize) -> usize {
        let mut inserted = 0;
        for ch in text.chars() {
            self.insert_value_unchecked(ch, offset + inserted);
            inserted += 1;
        }
        inserted
    }

    fn insert_fragment_unchecked(&mut self, fragment: &Fragment, offset: usize) {
        let inserted = self.insert_text_unchecked(&fragment.text, offset);
        for annotation in &fragment.annotations {
            let start = (annotation.start + offset).min(offset + inserted);
            let end = (annotation.end + offset).min(offset + inserted);
            if start < end {
                self.annotations.push(Annotation::new(start, end, annotation.kind.clone()));
            }
        }
    }

    fn remove_unchecked(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let (from, to) = (self.byte_index(start), self.byte_index(end));
        self.raw.replace_range(from..to, "");
        for annotation in &mut self.annotations {
            annotation.shift_for_remove(start, end);
        }
        self.annotations.retain(|a| !a.is_empty());
        self.fix_junction(start);
        self.resync();
    }

    /// Keep storage free of adjacent collapsible whitespace around `offset`
    fn fix_junction(&mut self, offset: usize) {
        if offset == 0 {
            return;
        }
        let before = self.char_at(offset - 1);
        let after = self.char_at(offset);
        if before.is_some_and(is_break_space) && after.is_some_and(is_break_space) {
            let idx = self.byte_index(offset);
            let len = after.map_or(1, char::len_utf8);
            self.raw.replace_range(idx..idx + len, &NO_BREAK_SPACE.to_string());
        }
    }

    fn resync(&mut self) {
        self.normalized = normalize_whitespace(&self.raw);
        debug_assert_eq!(self.normalized.chars().count(), self.raw.chars().count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnnotationKind;
    use text_engine::MonospaceMeasurer;

    fn style() -> TextStyle {
        TextStyle::new(10.0, 1.0)
    }

    #[test]
    fn test_insert_value_and_text() {
        let mut content = LineContent::new();
        content.insert_text("Hllo", 0).unwrap();
        content.insert_value('e', 1).unwrap();
        assert_eq!(content.text(), "Hello");
        assert_eq!(content.len(), 5);
    }

    #[test]
    fn test_insert_out_of_range_fails() {
        let mut content = LineContent::from_text("abc");
        assert!(content.insert_value('x', 4).is_err());
    }

    #[test]
    fn test_double_space_is_preserved() {
        let mut content = LineContent::from_text("a");
        content.insert_value(' ', 1).unwrap();
        content.insert_value(' ', 2).unwrap();
        content.insert_value('b', 3).unwrap();
        assert_eq!(content.text(), "a  b");
        assert_eq!(content.raw(), "a \u{a0}b");
        assert_eq!(content.len(), 4);
    }

    #[test]
    fn test_tab_is_stored_as_space() {
        let content = LineContent::from_text("a\tb");
        assert_eq!(content.raw(), "a b");
    }

    #[test]
    fn test_normalize_whitespace_collapses_runs() {
        assert_eq!(normalize_whitespace("a  \t b"), "a b");
        assert_eq!(normalize_whitespace("a\u{a0}\u{a0}b"), "a  b");
    }

    #[test]
    fn test_cut_copy_remove() {
        let mut content = LineContent::from_text("hello world");
        assert_eq!(content.copy(0, 5).unwrap(), "hello");
        assert_eq!(content.cut(5, 11).unwrap(), " world");
        assert_eq!(content.text(), "hello");
        content.remove_at(1, 3).unwrap();
        assert_eq!(content.text(), "hlo");
        assert!(content.cut(2, 9).is_err());
    }

    #[test]
    fn test_removal_keeps_spaces_apart() {
        let mut content = LineContent::from_text("a x b");
        content.remove_at(2, 3).unwrap();
        assert_eq!(content.text(), "a  b");
        assert_eq!(content.len(), 4);
    }

    #[test]
    fn test_pop_variants() {
        let mut content = LineContent::from_text("one two three ");
        assert_eq!(content.pop_last_word().text, "three ");
        assert_eq!(content.text(), "one two ");
        assert_eq!(content.pop_first_word().text, "one ");
        assert_eq!(content.text(), "two ");
        assert_eq!(content.pop().unwrap().text, " ");
        assert_eq!(content.pop_first_char().unwrap().text, "t");
        content.remove_first_word();
        assert!(content.is_empty());
        assert!(content.pop().is_none());
    }

    #[test]
    fn test_single_word_pop_takes_everything() {
        let mut content = LineContent::from_text("unbreakable");
        assert_eq!(content.last_word_start(), 0);
        assert_eq!(content.pop_last_word().text, "unbreakable");
        assert!(content.is_empty());
    }

    #[test]
    fn test_width_only_printable() {
        let measurer = MonospaceMeasurer::new(1.0);
        let content = LineContent::from_text("abc ");
        assert_eq!(content.width(&measurer, &style(), false), 40.0);
        assert_eq!(content.width(&measurer, &style(), true), 30.0);
    }

    #[test]
    fn test_empty_content_has_height() {
        let measurer = MonospaceMeasurer::new(1.0);
        let content = LineContent::new();
        assert_eq!(content.height(&measurer, &style()), 10.0);
        assert_eq!(content.width(&measurer, &style(), true), 0.0);
    }

    #[test]
    fn test_content_info_for_offset() {
        let measurer = MonospaceMeasurer::new(1.0);
        let content = LineContent::from_text("hello");
        let info = content.content_info_for_offset(&measurer, &style(), 1, 3).unwrap();
        assert_eq!(info.left, 10.0);
        assert_eq!(info.width, 20.0);
        assert_eq!(info.height, 10.0);
    }

    #[test]
    fn test_annotations_travel_with_cut() {
        let mut content = LineContent::from_text("bold text");
        content
            .add_annotation(Annotation::new(0, 4, AnnotationKind::Bold))
            .unwrap();
        let fragment = content.cut_fragment(2, 9).unwrap();
        assert_eq!(fragment.annotations, vec![Annotation::new(0, 2, AnnotationKind::Bold)]);
        assert_eq!(content.annotations(), &[Annotation::new(0, 2, AnnotationKind::Bold)]);

        let mut other = LineContent::from_text("x");
        other.insert_fragment(&fragment, 1).unwrap();
        assert_eq!(other.text(), "xld text");
        assert!(other
            .annotations()
            .contains(&Annotation::new(1, 3, AnnotationKind::Bold)));
    }

    #[test]
    fn test_fragment_insert_past_end_leaves_content_unchanged() {
        let mut content = LineContent::from_text("abc");
        assert!(content.insert_fragment(&Fragment::from_text("xyz"), 4).is_err());
        assert!(content.insert_text("xyz", 9).is_err());
        assert_eq!(content.raw(), "abc");
    }

    #[test]
    fn test_append_and_prepend_keep_annotations() {
        let fragment = Fragment {
            text: "bold ".to_string(),
            annotations: vec![Annotation::new(0, 4, AnnotationKind::Bold)],
        };
        let mut content = LineContent::from_text("mid ");
        content.prepend_fragment(&fragment);
        content.append_fragment(&fragment);
        assert_eq!(content.text(), "bold mid bold ");
        assert_eq!(
            content.annotations(),
            &[
                Annotation::new(0, 4, AnnotationKind::Bold),
                Annotation::new(9, 13, AnnotationKind::Bold),
            ]
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_cut_and_reinsert_preserves_text(text in "[a-z \t]{0,40}", a in 0usize..40, b in 0usize..40) {
                let mut content = LineContent::from_text(&text);
                let len = content.len();
                prop_assert_eq!(len, text.chars().count());
                let (start, end) = (a.min(b).min(len), a.max(b).min(len));
                let before = content.text().to_string();

                let fragment = content.cut_fragment(start, end).unwrap();
                prop_assert_eq!(content.len() + fragment.len(), len);
                content.insert_fragment(&fragment, start).unwrap();
                prop_assert_eq!(content.text(), before.as_str());
            }

            #[test]
            fn test_storage_never_holds_adjacent_spaces(text in "[ab \t]{0,40}") {
                let content = LineContent::from_text(&text);
                let chars: Vec<char> = content.raw().chars().collect();
                for pair in chars.windows(2) {
                    prop_assert!(!(is_break_space(pair[0]) && is_break_space(pair[1])));
                }
            }
        }
    }
}
