//! Slide sequences: which template slides go where.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Zero-based indices into the template deck, in output order.
///
/// Values may repeat; a repeated value asks for an independent copy of
/// that slide.
///
/// # Examples
///
/// ```rust
/// use deckweave::compose::SequenceSpec;
///
/// let spec: SequenceSpec = "0, 34,34,50".parse()?;
/// assert_eq!(spec.indices(), &[0, 34, 34, 50]);
/// # Ok::<(), deckweave::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSpec {
    indices: Vec<usize>,
}

impl SequenceSpec {
    /// A sequence from explicit indices. Must not be empty.
    pub fn new(indices: Vec<usize>) -> Result<Self> {
        if indices.is_empty() {
            return Err(Error::Input("slide sequence is empty".to_string()));
        }
        Ok(Self { indices })
    }

    /// Parse a comma-separated list of non-negative integers.
    ///
    /// Whitespace around items is ignored. Every malformed item is
    /// reported, not just the first.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::Input("slide sequence is empty".to_string()));
        }

        let mut indices = Vec::new();
        let mut problems = Vec::new();
        for (position, item) in text.split(',').enumerate() {
            let item = item.trim();
            if item.is_empty() {
                problems.push(format!("item {} is empty", position));
            } else if !item.bytes().all(|b| b.is_ascii_digit()) {
                problems.push(format!(
                    "item {} ({:?}) is not a non-negative integer",
                    position, item
                ));
            } else {
                match item.parse::<usize>() {
                    Ok(index) => indices.push(index),
                    Err(_) => problems.push(format!("item {} ({}) is too large", position, item)),
                }
            }
        }

        if !problems.is_empty() {
            return Err(Error::Input(format!(
                "malformed slide sequence {:?}: {}",
                text,
                problems.join("; ")
            )));
        }
        Self::new(indices)
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl FromStr for SequenceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SequenceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.indices.iter().map(usize::to_string).collect();
        f.write_str(&items.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tolerates_whitespace() {
        let spec = SequenceSpec::parse(" 0 ,34, 34 ,50 ").unwrap();
        assert_eq!(spec.indices(), &[0, 34, 34, 50]);
        assert_eq!(spec.to_string(), "0,34,34,50");
    }

    #[test]
    fn test_parse_rejects_malformed_items() {
        for bad in ["", "  ", "1,,2", "1,-2", "+1", "a", "1.5", "1,2,"] {
            let err = SequenceSpec::parse(bad).unwrap_err();
            assert!(matches!(err, Error::Input(_)), "{bad:?} should be an input error");
        }
    }

    #[test]
    fn test_parse_reports_every_problem() {
        let err = SequenceSpec::parse("x,1,,y").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("item 0"));
        assert!(text.contains("item 2"));
        assert!(text.contains("item 3"));
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(SequenceSpec::new(Vec::new()).is_err());
    }
}
