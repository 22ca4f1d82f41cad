//! Wildcard template parsing and combination counting
//!
//! Templates constrain the candidate space: literal runs match themselves,
//! `?` matches exactly one alphabet character, `*` matches zero or more. A
//! backslash escapes the next character into the literal run.

use std::fmt;

/// One parsed template segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Fixed characters copied verbatim into the candidate
    Literal(String),
    /// Exactly one alphabet character (`?`)
    One,
    /// Zero or more alphabet characters (`*`)
    Many,
}

/// Shape summary of a parsed template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternInfo {
    /// Literal characters plus `?` positions; the shortest match length
    pub fixed_len: u32,
    /// Number of `?` segments
    pub wildcards: u32,
    /// Number of `*` segments
    pub stars: u32,
}

/// A parsed wildcard template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Tokenize a template left to right. A dangling trailing backslash is
    /// dropped, matching the legacy tokenizer.
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut escape = false;

        for ch in source.chars() {
            if escape {
                literal.push(ch);
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '?' || ch == '*' {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(if ch == '?' { Segment::One } else { Segment::Many });
            } else {
                literal.push(ch);
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Pattern { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn info(&self) -> PatternInfo {
        let mut info = PatternInfo {
            fixed_len: 0,
            wildcards: 0,
            stars: 0,
        };
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => info.fixed_len += text.chars().count() as u32,
                Segment::One => {
                    info.fixed_len += 1;
                    info.wildcards += 1;
                }
                Segment::Many => info.stars += 1,
            }
        }
        info
    }

    /// Number of candidates of exactly `length` characters matching this
    /// template over an alphabet of `sigma` characters.
    ///
    /// Returns `None` when the count overflows 64 bits or when the template
    /// holds two or more `*` segments, which the indexed enumeration does not
    /// support.
    pub fn combinations(&self, sigma: u64, length: u32) -> Option<u64> {
        if sigma == 0 {
            return Some(0);
        }
        let info = self.info();
        if length < info.fixed_len {
            return Some(0);
        }

        let free_chars = match info.stars {
            0 => {
                if length != info.fixed_len {
                    return Some(0);
                }
                info.wildcards
            }
            1 => info.wildcards + (length - info.fixed_len),
            _ => return None,
        };

        let mut combinations: u64 = 1;
        for _ in 0..free_chars {
            combinations = combinations.checked_mul(sigma)?;
        }
        Some(combinations)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => {
                    for ch in text.chars() {
                        if ch == '?' || ch == '*' || ch == '\\' {
                            write!(f, "\\{ch}")?;
                        } else {
                            write!(f, "{ch}")?;
                        }
                    }
                }
                Segment::One => write!(f, "?")?,
                Segment::Many => write!(f, "*")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals_and_wildcards() {
        let pattern = Pattern::parse("ab?cd*e");
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("ab".into()),
                Segment::One,
                Segment::Literal("cd".into()),
                Segment::Many,
                Segment::Literal("e".into()),
            ]
        );
    }

    #[test]
    fn test_parse_escapes_join_literal() {
        let pattern = Pattern::parse(r"a\*b\?c");
        assert_eq!(pattern.segments(), &[Segment::Literal("a*b?c".into())]);

        let info = pattern.info();
        assert_eq!(info.fixed_len, 5);
        assert_eq!(info.wildcards, 0);
        assert_eq!(info.stars, 0);
    }

    #[test]
    fn test_parse_adjacent_wildcards_stay_separate() {
        let pattern = Pattern::parse("*?");
        assert_eq!(pattern.segments(), &[Segment::Many, Segment::One]);
    }

    #[test]
    fn test_parse_empty_template() {
        let pattern = Pattern::parse("");
        assert!(pattern.is_empty());
    }

    #[test]
    fn test_parse_dangling_escape_dropped() {
        let pattern = Pattern::parse(r"ab\");
        assert_eq!(pattern.segments(), &[Segment::Literal("ab".into())]);
    }

    #[test]
    fn test_escaped_backslash() {
        let pattern = Pattern::parse(r"a\\?");
        assert_eq!(
            pattern.segments(),
            &[Segment::Literal(r"a\".into()), Segment::One]
        );
    }

    #[test]
    fn test_info_counts() {
        let info = Pattern::parse("x?y*z?*").info();
        assert_eq!(info.fixed_len, 5); // 3 literals + 2 '?'
        assert_eq!(info.wildcards, 2);
        assert_eq!(info.stars, 2);
    }

    #[test]
    fn test_combinations_fixed_length() {
        // "1?0" over a binary alphabet matches only length 3, two ways.
        let pattern = Pattern::parse("1?0");
        assert_eq!(pattern.combinations(2, 3), Some(2));
        assert_eq!(pattern.combinations(2, 2), Some(0));
        assert_eq!(pattern.combinations(2, 4), Some(0));
    }

    #[test]
    fn test_combinations_single_star() {
        // "a*b" with sigma=2: star absorbs length - 2 characters.
        let pattern = Pattern::parse("a*b");
        assert_eq!(pattern.combinations(2, 2), Some(1));
        assert_eq!(pattern.combinations(2, 3), Some(2));
        assert_eq!(pattern.combinations(2, 4), Some(4));
        assert_eq!(pattern.combinations(2, 1), Some(0));
    }

    #[test]
    fn test_combinations_pure_literal() {
        let pattern = Pattern::parse("abc");
        assert_eq!(pattern.combinations(26, 3), Some(1));
        assert_eq!(pattern.combinations(26, 4), Some(0));
    }

    #[test]
    fn test_combinations_multi_star_unsupported() {
        let pattern = Pattern::parse("a*b*c");
        assert_eq!(pattern.combinations(2, 10), None);
    }

    #[test]
    fn test_combinations_overflow() {
        let pattern = Pattern::parse("*");
        assert_eq!(pattern.combinations(1000, 22), None);
        assert_eq!(pattern.combinations(2, 63), Some(1u64 << 63));
    }

    #[test]
    fn test_display_round_trips_escapes() {
        for source in [r"a\*b\?c", "ab?cd*e", "*?", ""] {
            let pattern = Pattern::parse(source);
            assert_eq!(Pattern::parse(&pattern.to_string()), pattern);
        }
    }
}
