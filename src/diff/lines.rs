//! diff::lines
//!
//! Line-level text diff with intra-line hints.
//!
//! # Format
//!
//! Each output line starts with a two-character marker:
//!
//! ```text
//! "  " unchanged
//! "- " only in the old text
//! "+ " only in the new text
//! "? " hint for the line above
//! ```
//!
//! A hint line marks replaced (`^`), deleted (`-`) and inserted (`+`)
//! characters under a near-matching line. Near matches are pairs inside a
//! replaced block whose character similarity is at least the cutoff.
//!
//! # Algorithm
//!
//! Lines are aligned with Myers (via `similar`). Each replaced block is
//! searched for its most similar pair, which is emitted with hints; the
//! lines before and after that pair are processed the same way. Blocks with
//! no pair at or above the cutoff are emitted as removals then additions.
//!
//! # Example
//!
//! ```
//! use luna::diff::lines::LineDiff;
//!
//! let diff = LineDiff::compute("one\ntwo\n", "one\ntwo\nthree\n");
//! assert_eq!(diff.added().collect::<Vec<_>>(), vec!["three"]);
//! assert_eq!(diff.removed_count(), 0);
//! ```

use std::fmt;

use similar::{capture_diff_slices, Algorithm, DiffTag, TextDiff};

/// Default similarity cutoff for hint lines.
pub const DEFAULT_HINT_CUTOFF: f32 = 0.75;

/// Classification of one output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    Equal,
    Delete,
    Insert,
    Hint,
}

impl LineTag {
    /// The two-character prefix.
    pub fn marker(&self) -> &'static str {
        match self {
            LineTag::Equal => "  ",
            LineTag::Delete => "- ",
            LineTag::Insert => "+ ",
            LineTag::Hint => "? ",
        }
    }
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: LineTag,
    pub text: String,
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tag.marker(), self.text)
    }
}

/// A computed line diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiff {
    lines: Vec<DiffLine>,
}

impl LineDiff {
    /// Diff two texts with the default hint cutoff.
    pub fn compute(old: &str, new: &str) -> Self {
        Self::compute_with_cutoff(old, new, DEFAULT_HINT_CUTOFF)
    }

    /// Diff two texts. Both are split on `\n`.
    pub fn compute_with_cutoff(old: &str, new: &str, cutoff: f32) -> Self {
        let a: Vec<&str> = old.split('\n').collect();
        let b: Vec<&str> = new.split('\n').collect();

        let mut builder = Builder {
            a: &a,
            b: &b,
            cutoff,
            out: Vec::new(),
        };

        for op in capture_diff_slices(Algorithm::Myers, &a, &b) {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => builder.dump(LineTag::Equal, &a[old_range]),
                DiffTag::Delete => builder.dump(LineTag::Delete, &a[old_range]),
                DiffTag::Insert => builder.dump(LineTag::Insert, &b[new_range]),
                DiffTag::Replace => builder.replace(
                    old_range.start,
                    old_range.end,
                    new_range.start,
                    new_range.end,
                ),
            }
        }

        LineDiff { lines: builder.out }
    }

    /// Every line of a text present only on the old side, unaligned.
    ///
    /// A final newline does not produce a trailing empty line, and an empty
    /// text yields no lines.
    pub fn removal(text: &str) -> Self {
        Self::listing(text, LineTag::Delete)
    }

    /// Every line of a text present only on the new side, unaligned.
    pub fn addition(text: &str) -> Self {
        Self::listing(text, LineTag::Insert)
    }

    fn listing(text: &str, tag: LineTag) -> Self {
        let lines = text
            .split_terminator('\n')
            .map(|line| DiffLine {
                tag,
                text: line.to_string(),
            })
            .collect();
        LineDiff { lines }
    }

    /// All output lines in order.
    pub fn lines(&self) -> &[DiffLine] {
        &self.lines
    }

    /// Lines only in the new text.
    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.with_tag(LineTag::Insert)
    }

    /// Lines only in the old text.
    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.with_tag(LineTag::Delete)
    }

    pub fn added_count(&self) -> usize {
        self.added().count()
    }

    pub fn removed_count(&self) -> usize {
        self.removed().count()
    }

    /// True when no line was added or removed.
    pub fn is_unchanged(&self) -> bool {
        self.lines.iter().all(|l| l.tag == LineTag::Equal)
    }

    fn with_tag(&self, tag: LineTag) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(move |l| l.tag == tag)
            .map(|l| l.text.as_str())
    }
}

impl fmt::Display for LineDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", line)?;
        }
        Ok(())
    }
}

struct Builder<'a> {
    a: &'a [&'a str],
    b: &'a [&'a str],
    cutoff: f32,
    out: Vec<DiffLine>,
}

impl Builder<'_> {
    fn push(&mut self, tag: LineTag, text: impl Into<String>) {
        self.out.push(DiffLine {
            tag,
            text: text.into(),
        });
    }

    fn dump(&mut self, tag: LineTag, lines: &[&str]) {
        for line in lines {
            self.push(tag, *line);
        }
    }

    /// Emit `a[alo..ahi]` replaced by `b[blo..bhi]`.
    fn replace(&mut self, alo: usize, ahi: usize, blo: usize, bhi: usize) {
        let Some((besti, bestj)) = self.best_pair(alo, ahi, blo, bhi) else {
            let (a, b) = (self.a, self.b);
            self.dump(LineTag::Delete, &a[alo..ahi]);
            self.dump(LineTag::Insert, &b[blo..bhi]);
            return;
        };

        self.sub_block(alo, besti, blo, bestj);
        self.near_match(self.a[besti], self.b[bestj]);
        self.sub_block(besti + 1, ahi, bestj + 1, bhi);
    }

    fn sub_block(&mut self, alo: usize, ahi: usize, blo: usize, bhi: usize) {
        let (a, b) = (self.a, self.b);
        match (alo < ahi, blo < bhi) {
            (true, true) => self.replace(alo, ahi, blo, bhi),
            (true, false) => self.dump(LineTag::Delete, &a[alo..ahi]),
            (false, true) => self.dump(LineTag::Insert, &b[blo..bhi]),
            (false, false) => {}
        }
    }

    /// The first most-similar pair at or above the cutoff.
    fn best_pair(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Option<(usize, usize)> {
        let mut best: Option<(f32, usize, usize)> = None;

        for j in blo..bhi {
            let bline = self.b[j];
            let blen = bline.chars().count();
            for i in alo..ahi {
                let aline = self.a[i];
                let alen = aline.chars().count();

                let floor = best.map_or(self.cutoff, |(r, _, _)| r.max(self.cutoff));
                // Upper bound on the ratio from lengths alone.
                let total = alen + blen;
                if total > 0 && 2.0 * alen.min(blen) as f32 / (total as f32) < floor {
                    continue;
                }

                let ratio = TextDiff::from_chars(aline, bline).ratio();
                let better = match best {
                    Some((r, _, _)) => ratio > r,
                    None => ratio >= self.cutoff,
                };
                if better {
                    best = Some((ratio, i, j));
                }
            }
        }

        best.map(|(_, i, j)| (i, j))
    }

    /// A removed/added pair with hint lines.
    fn near_match(&mut self, aline: &str, bline: &str) {
        if aline == bline {
            self.push(LineTag::Equal, aline);
            return;
        }

        let a: Vec<char> = aline.chars().collect();
        let b: Vec<char> = bline.chars().collect();
        let mut atags = String::new();
        let mut btags = String::new();

        for op in capture_diff_slices(Algorithm::Myers, &a, &b) {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            let (la, lb) = (old_range.len(), new_range.len());
            match tag {
                DiffTag::Equal => {
                    atags.extend(std::iter::repeat(' ').take(la));
                    btags.extend(std::iter::repeat(' ').take(lb));
                }
                DiffTag::Replace => {
                    atags.extend(std::iter::repeat('^').take(la));
                    btags.extend(std::iter::repeat('^').take(lb));
                }
                DiffTag::Delete => atags.extend(std::iter::repeat('-').take(la)),
                DiffTag::Insert => btags.extend(std::iter::repeat('+').take(lb)),
            }
        }

        self.push(LineTag::Delete, aline);
        self.hint(&a, &atags);
        self.push(LineTag::Insert, bline);
        self.hint(&b, &btags);
    }

    /// Emit a hint line, keeping tabs and other whitespace from the text so
    /// markers stay aligned.
    fn hint(&mut self, text: &[char], tags: &str) {
        let aligned: String = text
            .iter()
            .zip(tags.chars())
            .map(|(c, t)| if t == ' ' && c.is_whitespace() { *c } else { t })
            .collect();
        let trimmed = aligned.trim_end();
        if !trimmed.is_empty() {
            self.push(LineTag::Hint, trimmed);
        }
    }
}
