//! Viterbi-based tokenizer.
pub(crate) mod lattice;
pub mod worker;

use std::sync::Arc;

use crate::Dictionary;
use crate::dictionary::DictionaryInner;
use crate::dictionary::connector::ConnectorCost;
use crate::errors::{Result, TsumugiError};
use crate::sentence::Sentence;
use crate::tokenizer::lattice::LatticeBuild;
use crate::tokenizer::worker::Worker;

/// Tokenizer.
///
/// Cloning is cheap: the dictionary is shared.
#[derive(Clone)]
pub struct Tokenizer {
    dict: Arc<Dictionary>,
    // For the MeCab compatibility
    space_cateset: Option<u32>,
    max_grouping_len: Option<usize>,
}

impl Tokenizer {
    /// Creates a new tokenizer.
    pub fn new(dict: Dictionary) -> Self {
        Self::from_shared_dictionary(Arc::new(dict))
    }

    /// Creates a new tokenizer from `DictionaryInner`.
    pub fn from_inner(dict: DictionaryInner) -> Self {
        Self::new(Dictionary::from_inner(dict))
    }

    /// Creates a new tokenizer sharing a dictionary with other tokenizers.
    pub fn from_shared_dictionary(dict: Arc<Dictionary>) -> Self {
        Self {
            dict,
            space_cateset: None,
            max_grouping_len: None,
        }
    }

    /// Ignores spaces from tokens.
    ///
    /// Characters of category `SPACE` preceding a word are skipped and
    /// attributed to that word. A whitespace run at the very end of the input
    /// is kept as a token so that the path still covers the text.
    ///
    /// # Errors
    ///
    /// [`TsumugiError`] is returned when category `SPACE` is not defined in the
    /// input dictionary.
    pub fn ignore_space(mut self, yes: bool) -> Result<Self> {
        if yes {
            let cate_id = self
                .dict
                .inner()
                .char_prop()
                .cate_id("SPACE")
                .ok_or_else(|| {
                    TsumugiError::invalid_argument(
                        "dict",
                        "SPACE is not defined in the input dictionary (i.e., char.def).",
                    )
                })?;
            self.space_cateset = Some(1 << cate_id);
        } else {
            self.space_cateset = None;
        }
        Ok(self)
    }

    /// Specifies the maximum grouping length for unknown words.
    ///
    /// The default value 0 means the length is unbounded. Specify `24` to obtain
    /// the same results as MeCab.
    pub const fn max_grouping_len(mut self, max_grouping_len: usize) -> Self {
        if max_grouping_len != 0 {
            self.max_grouping_len = Some(max_grouping_len);
        } else {
            self.max_grouping_len = None;
        }
        self
    }

    /// Gets the reference to the dictionary.
    #[inline(always)]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    #[inline(always)]
    pub(crate) fn dict_inner(&self) -> &DictionaryInner {
        self.dict.inner()
    }

    /// Creates a new worker.
    pub fn new_worker(&self) -> Worker {
        Worker::new(self.clone())
    }

    pub(crate) fn build_lattice<L>(&self, sent: &Sentence, lattice: &mut L)
    where
        L: LatticeBuild,
    {
        let connector = self.dict_inner().connector();
        lattice.reset(sent.len_char());

        // These variables indicate the starting character positions of words currently stored
        // in the lattice. If ignore_space() is unset, these always have the same values, and
        // start_node is practically non-functional. If ignore_space() is set, start_node and
        // start_word indicate the starting positions containing and ignoring a space character,
        // respectively. Suppose handle sentence "mens second" at position 4. start_node indicates
        // position 4, and start_word indicates position 5.
        let mut start_node = 0;
        let mut start_word = 0;

        while start_word < sent.len_char() {
            if !lattice.has_previous_node(start_node) {
                start_word += 1;
                start_node = start_word;
                continue;
            }

            if let Some(space_cateset) = self.space_cateset {
                let is_space = (sent.char_info(start_node).cate_idset() & space_cateset) != 0;
                if is_space {
                    start_word += sent.groupable(start_node);
                }
            }

            // Trailing spaces are tokenized as they are.
            if start_word == sent.len_char() {
                start_word = start_node;
            }

            self.add_lattice_edges(sent, lattice, start_node, start_word, connector);

            start_word += 1;
            start_node = start_word;
        }

        lattice.insert_eos(start_node, connector);
    }

    // Candidates are inserted in a fixed order: user lexicons in load order,
    // the system lexicon, then unknown words.
    fn add_lattice_edges<L, C>(
        &self,
        sent: &Sentence,
        lattice: &mut L,
        start_node: usize,
        start_word: usize,
        connector: &C,
    ) where
        L: LatticeBuild,
        C: ConnectorCost,
    {
        let dict = self.dict_inner();
        let mut has_matched = false;
        let suffix = &sent.chars()[start_word..];

        let lexicons = dict
            .user_lexicons()
            .iter()
            .chain(std::iter::once(dict.system_lexicon()));
        for lexicon in lexicons {
            for m in lexicon.common_prefix_iterator(suffix) {
                debug_assert!(start_word + m.end_char <= sent.len_char());
                lattice.insert_node(
                    start_node,
                    start_word,
                    start_word + m.end_char,
                    m.word_idx,
                    m.word_param,
                    connector,
                );
                has_matched = true;
            }
        }

        dict.unk_handler().gen_unk_words(
            sent,
            start_word,
            has_matched,
            self.max_grouping_len,
            |w| {
                lattice.insert_node(
                    start_node,
                    w.start_char(),
                    w.end_char(),
                    w.word_idx(),
                    w.word_param(),
                    connector,
                );
            },
        );
    }
}
