use rkyv::{Archive, Deserialize, Serialize};

use crate::dictionary::LexType;

/// Identifier of a word.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Archive, Serialize, Deserialize)]
pub struct WordIdx {
    /// Type of a lexicon that contains the word.
    pub lex_type: LexType,

    /// Position of the user lexicon in load order. Zero otherwise.
    pub lex_id: u16,

    /// ID of the word.
    pub word_id: u32,
}

impl Default for WordIdx {
    fn default() -> Self {
        Self::new(LexType::System, u32::MAX)
    }
}

impl WordIdx {
    #[inline(always)]
    pub(crate) const fn new(lex_type: LexType, word_id: u32) -> Self {
        Self {
            lex_type,
            lex_id: 0,
            word_id,
        }
    }

    #[inline(always)]
    pub(crate) const fn with_lex_id(lex_type: LexType, lex_id: u16, word_id: u32) -> Self {
        Self {
            lex_type,
            lex_id,
            word_id,
        }
    }
}
