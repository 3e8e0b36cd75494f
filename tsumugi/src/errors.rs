//! Definition of errors.

use std::fmt;
use std::path::PathBuf;

/// A specialized Result type for Tsumugi.
pub type Result<T, E = TsumugiError> = std::result::Result<T, E>;

/// The error type for Tsumugi.
#[derive(Debug, thiserror::Error)]
pub enum TsumugiError {
    /// The error variant for [`InvalidArgumentError`].
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// The error variant for [`InvalidFormatError`].
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// The error variant for [`InvalidStateError`].
    #[error(transparent)]
    InvalidState(InvalidStateError),

    /// The error variant for [`InitializationError`].
    #[error(transparent)]
    Initialization(InitializationError),

    /// The error variant for [`DictionaryLoadError`].
    #[error(transparent)]
    DictionaryLoad(DictionaryLoadError),

    /// The error variant for [`SchemaMismatchError`].
    #[error(transparent)]
    SchemaMismatch(SchemaMismatchError),

    /// The error variant for [`NoPathError`].
    #[error(transparent)]
    NoPath(NoPathError),

    /// The error variant for [`InvalidInputError`].
    #[error(transparent)]
    InvalidInput(InvalidInputError),

    /// The error variant for [`TryFromIntError`](std::num::TryFromIntError).
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// The error variant for [`ParseIntError`](std::num::ParseIntError).
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    /// The error variant for [`std::str::Utf8Error`].
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    /// The error variant for [`std::io::Error`].
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The error variant for [`rkyv::rancor::Error`].
    #[error(transparent)]
    Rkyv(#[from] rkyv::rancor::Error),
}

impl TsumugiError {
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }

    pub(crate) fn dictionary_load<P, S>(path: P, reason: S) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        Self::DictionaryLoad(DictionaryLoadError {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// Returns `true` if the error was raised while constructing a tagger or
    /// loading one of its dictionaries.
    pub const fn is_initialization(&self) -> bool {
        matches!(self, Self::Initialization(_) | Self::DictionaryLoad(_))
    }
}

/// Error used when the argument is invalid.
#[derive(Debug, thiserror::Error)]
#[error("InvalidArgumentError: {arg}: {msg}")]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

/// Error used when the input format is invalid.
#[derive(Debug, thiserror::Error)]
#[error("InvalidFormatError: {arg}: {msg}")]
pub struct InvalidFormatError {
    /// Name of the format.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

/// Error used when the state is invalid.
#[derive(Debug, thiserror::Error)]
#[error("InvalidStateError: {msg}: {cause}")]
pub struct InvalidStateError {
    /// Error message.
    pub(crate) msg: String,

    /// Underlying cause of the error.
    pub(crate) cause: String,
}

/// Error used when a tagger cannot be constructed.
///
/// The rendered message spans several lines: a headline, every location or
/// step that was checked, and what to install or configure.
#[derive(Debug)]
pub struct InitializationError {
    pub(crate) headline: String,
    pub(crate) checked: Vec<String>,
    pub(crate) hints: Vec<String>,
}

impl InitializationError {
    pub(crate) fn new<S>(headline: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            headline: headline.into(),
            checked: vec![],
            hints: vec![],
        }
    }

    pub(crate) fn checked<S>(mut self, what: S) -> Self
    where
        S: Into<String>,
    {
        self.checked.push(what.into());
        self
    }

    pub(crate) fn hint<S>(mut self, hint: S) -> Self
    where
        S: Into<String>,
    {
        self.hints.push(hint.into());
        self
    }

    /// Short description of what failed.
    pub fn headline(&self) -> &str {
        &self.headline
    }

    /// Locations and steps examined before giving up.
    pub fn checked_locations(&self) -> &[String] {
        &self.checked
    }
}

impl fmt::Display for InitializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InitializationError: {}", self.headline)?;
        if !self.checked.is_empty() {
            write!(f, "\n  checked:")?;
            for c in &self.checked {
                write!(f, "\n    - {c}")?;
            }
        }
        if !self.hints.is_empty() {
            write!(f, "\n  to fix:")?;
            for h in &self.hints {
                write!(f, "\n    - {h}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for InitializationError {}

impl From<InitializationError> for TsumugiError {
    fn from(error: InitializationError) -> Self {
        Self::Initialization(error)
    }
}

/// Error used when a dictionary file or directory cannot be loaded.
#[derive(Debug, thiserror::Error)]
#[error("DictionaryLoadError: {}: {reason}", .path.display())]
pub struct DictionaryLoadError {
    /// Location that failed to load.
    pub(crate) path: PathBuf,

    /// Why it failed.
    pub(crate) reason: String,
}

impl DictionaryLoadError {
    /// Location that failed to load.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

/// Error used when a feature string does not fit the configured schema.
#[derive(Debug, thiserror::Error)]
#[error(
    "SchemaMismatchError: feature has {found} fields, expected {}: {feature:?}",
    fmt_arities(.expected)
)]
pub struct SchemaMismatchError {
    /// Number of fields found in the feature string.
    pub(crate) found: usize,

    /// Arities that would have been accepted.
    pub(crate) expected: Vec<usize>,

    /// The offending feature string.
    pub(crate) feature: String,
}

impl SchemaMismatchError {
    /// Number of fields found in the feature string.
    pub const fn found(&self) -> usize {
        self.found
    }

    /// Arities that would have been accepted.
    pub fn expected(&self) -> &[usize] {
        &self.expected
    }

    /// The offending feature string.
    pub fn feature(&self) -> &str {
        &self.feature
    }
}

fn fmt_arities(arities: &[usize]) -> String {
    match arities {
        [n] => format!("at most {n}"),
        _ => {
            let v: Vec<_> = arities.iter().map(|a| a.to_string()).collect();
            format!("one of {}", v.join(", "))
        }
    }
}

/// Error used when no path connects BOS to EOS.
///
/// Unknown-word generation makes every character coverable, so this signals
/// a defect in the dictionary (e.g. a character category without unk.def
/// entries) rather than a problem with the input.
#[derive(Debug, thiserror::Error)]
#[error("NoPathError: no path reaches EOS; input has {len_char} chars, stuck at position {position}")]
pub struct NoPathError {
    /// Length of the input in characters.
    pub(crate) len_char: usize,

    /// Furthest character position reached from BOS.
    pub(crate) position: usize,
}

impl NoPathError {
    /// Furthest character position reached from BOS. Nothing starting there
    /// connects onward.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Length of the input in characters.
    pub const fn len_char(&self) -> usize {
        self.len_char
    }
}

/// Error used when the input text is not valid UTF-8.
#[derive(Debug, thiserror::Error)]
#[error("InvalidInputError: invalid UTF-8 sequence at byte offset {offset}")]
pub struct InvalidInputError {
    /// Byte offset of the first invalid sequence.
    pub(crate) offset: usize,
}

impl InvalidInputError {
    /// Byte offset of the first invalid sequence.
    pub const fn offset(&self) -> usize {
        self.offset
    }
}
