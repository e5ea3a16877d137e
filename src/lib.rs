//! Composable, self-simplifying regular expression builders.
//!
//! A [`Pattern`] is an immutable syntax node wrapping a rendered regex
//! fragment. Nodes are combined with `|` (union) and `+` (concatenation),
//! and every combination runs through a simplification engine that returns
//! the smallest canonical equivalent it can prove:
//!
//! - Unions of character-level fragments are re-partitioned into runs and
//!   collapsed into canonical classes (`[0-4]|[3-9]` becomes `\d`).
//! - Quantifiers over the same inner pattern merge their occurrence
//!   intervals (`a{2,4}|a{4,7}` becomes `a{2,7}`, `a + a*` becomes `a+`).
//! - Concatenation re-merges only the two elements adjacent to the splice
//!   point, so chains normalize the same way regardless of grouping.
//!
//! Where no symbolic rule applies, the engine consults a bounded
//! example-generation oracle: fragments merge only when every enumerated
//! example of one fully matches the other. The oracle is a documented
//! approximation, not an automaton-based equivalence check; it can miss
//! merges, never invent them.
//!
//! ```
//! use regexfactory::{DIGIT, Pattern};
//!
//! let digits = (Pattern::range('0', '4') | Pattern::range('3', '9'))?;
//! assert_eq!(digits, DIGIT.clone());
//!
//! let two = DIGIT.clone() + DIGIT.clone();
//! assert_eq!(two.to_string(), r"\d{2}");
//! # Ok::<(), regexfactory::Error>(())
//! ```
//!
//! Everything in the crate is synchronous, deterministic and free of shared
//! mutable state; nodes are immutable once constructed, so they can be read
//! from any number of threads without coordination.

use std::fmt;

mod chars;
mod concat;
pub mod extension;
mod merge;
mod oracle;
mod pattern;
mod quantify;


pub use chars::{
    ANCHOR_END, ANCHOR_START, ANY, DIGIT, NOT_DIGIT, NOT_WHITESPACE, NOT_WORD, WHITESPACE, WORD,
};
pub use oracle::REPEAT_SAMPLE_LIMIT;
pub use pattern::{ESCAPED_CHARACTERS, Pattern};

/// Errors reported by constructors, merge operators and the example oracle.
///
/// Internal invariant violations (an empty alternation member set, reversed
/// occurrence bounds, a zero multiplier) are programmer errors and panic
/// instead of surfacing here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A constructor or operator was handed input that violates its
    /// contract: fewer than two operands to a concatenation sequence, an
    /// empty alternation, or an occurrence comparison across different
    /// inner patterns.
    InvalidInput(String),
    /// The example oracle could not process a fragment. Carries the
    /// offending fragment's rendered text for diagnosis; never recovered
    /// from internally, always propagated.
    Generation {
        /// Rendered text of the fragment that failed.
        pattern: String,
        /// Underlying parse or compile failure.
        detail: String,
    },
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    pub(crate) fn generation(pattern: impl Into<String>, detail: impl fmt::Display) -> Self {
        Error::Generation { pattern: pattern.into(), detail: detail.to_string() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Error::Generation { pattern, detail } => {
                write!(f, "cannot generate examples for `{pattern}`: {detail}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
