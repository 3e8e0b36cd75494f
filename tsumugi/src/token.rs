//! Container of resultant tokens.
use std::ops::Range;

use crate::dictionary::{LexType, WordIdx};
use crate::errors::Result;
use crate::feature::{FeatureSchema, Features};
use crate::tokenizer::lattice::Node;
use crate::tokenizer::worker::Worker;

/// Kind of a lattice node.
///
/// Tokens handed out by [`Worker`] and the tagger are always `Normal` or
/// `Unknown`; the sentinels stay inside the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    /// A word from the system or a user lexicon.
    Normal,
    /// A word synthesized from character categories.
    Unknown,
    /// Beginning of the sentence.
    Bos,
    /// End of the sentence.
    Eos,
}

impl NodeStatus {
    /// MeCab's numeric stat code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Unknown => 1,
            Self::Bos => 2,
            Self::Eos => 3,
        }
    }
}

/// Resultant token.
pub struct Token<'w> {
    worker: &'w Worker,
    nodes: &'w [(usize, Node)],
    index: usize,
}

impl<'w> Token<'w> {
    #[inline(always)]
    pub(crate) const fn new(worker: &'w Worker, nodes: &'w [(usize, Node)], index: usize) -> Self {
        Self {
            worker,
            nodes,
            index,
        }
    }

    #[inline(always)]
    fn node(&self) -> &'w (usize, Node) {
        &self.nodes[self.index]
    }

    /// Gets the position range of the token in characters.
    #[inline(always)]
    pub fn range_char(&self) -> Range<usize> {
        let (end_word, node) = self.node();
        node.start_word..*end_word
    }

    /// Gets the position range of the token in bytes.
    #[inline(always)]
    pub fn range_byte(&self) -> Range<usize> {
        let sent = &self.worker.sent;
        let (end_word, node) = self.node();
        sent.byte_position(node.start_word)..sent.byte_position(*end_word)
    }

    /// Gets the surface string of the token.
    #[inline(always)]
    pub fn surface(&self) -> &'w str {
        let sent = &self.worker.sent;
        &sent.raw()[self.range_byte()]
    }

    /// Byte length of the surface.
    #[inline(always)]
    pub fn length(&self) -> usize {
        self.range_byte().len()
    }

    /// Byte length of the surface and the whitespace skipped before it.
    #[inline(always)]
    pub fn rlength(&self) -> usize {
        let sent = &self.worker.sent;
        let (end_word, node) = self.node();
        sent.byte_position(*end_word) - sent.byte_position(node.start_node)
    }

    /// Whitespace skipped before the token. Empty unless
    /// [`Tokenizer::ignore_space`](crate::Tokenizer::ignore_space) is set.
    #[inline(always)]
    pub fn white_space(&self) -> &'w str {
        let sent = &self.worker.sent;
        let (_, node) = self.node();
        &sent.raw()[sent.byte_position(node.start_node)..sent.byte_position(node.start_word)]
    }

    /// Gets the word index of the token.
    #[inline(always)]
    pub fn word_idx(&self) -> WordIdx {
        self.node().1.word_idx()
    }

    /// Gets the feature string of the token.
    #[inline(always)]
    pub fn feature(&self) -> &'w str {
        self.worker
            .tokenizer
            .dictionary()
            .word_feature(self.word_idx())
    }

    /// Decodes the feature string with `schema`.
    pub fn features(&self, schema: FeatureSchema) -> Result<Features> {
        schema.decode(self.feature())
    }

    /// Gets the lexicon type where the token is from.
    #[inline(always)]
    pub fn lex_type(&self) -> LexType {
        self.word_idx().lex_type
    }

    /// Whether the token comes from a lexicon or was synthesized.
    #[inline(always)]
    pub fn status(&self) -> NodeStatus {
        match self.lex_type() {
            LexType::Unknown => NodeStatus::Unknown,
            LexType::System | LexType::User => NodeStatus::Normal,
        }
    }

    /// Category id (in `char.def` order) of the first character.
    #[inline(always)]
    pub fn char_type(&self) -> u32 {
        let (_, node) = self.node();
        self.worker.sent.char_info(node.start_word).base_id()
    }

    /// Gets the left id of the token's node.
    #[inline(always)]
    pub fn left_id(&self) -> u16 {
        self.node().1.left_id
    }

    /// Gets the right id of the token's node.
    #[inline(always)]
    pub fn right_id(&self) -> u16 {
        self.node().1.right_id
    }

    /// Gets the word cost of the token's node.
    #[inline(always)]
    pub fn word_cost(&self) -> i16 {
        self.worker
            .tokenizer
            .dict_inner()
            .word_param(self.word_idx())
            .word_cost
    }

    /// Gets the total cost from BOS to the token's node.
    #[inline(always)]
    pub fn total_cost(&self) -> i32 {
        self.node().1.min_cost
    }

    /// Copies the token out of the worker, decoding its feature with `schema`.
    ///
    /// # Errors
    ///
    /// See [`FeatureSchema::decode`].
    pub fn to_morpheme(&self, schema: FeatureSchema) -> Result<Morpheme> {
        Ok(Morpheme {
            surface: self.surface().to_string(),
            feature: self.feature().to_string(),
            features: self.features(schema)?,
            range_char: self.range_char(),
            range_byte: self.range_byte(),
            length: self.length(),
            rlength: self.rlength(),
            white_space: self.white_space().to_string(),
            status: self.status(),
            lex_type: self.lex_type(),
            left_id: self.left_id(),
            right_id: self.right_id(),
            word_cost: self.word_cost(),
            total_cost: self.total_cost(),
            char_type: self.char_type(),
        })
    }
}

impl std::fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("surface", &self.surface())
            .field("range_char", &self.range_char())
            .field("range_byte", &self.range_byte())
            .field("feature", &self.feature())
            .field("status", &self.status())
            .field("left_id", &self.left_id())
            .field("right_id", &self.right_id())
            .field("word_cost", &self.word_cost())
            .field("total_cost", &self.total_cost())
            .finish()
    }
}

/// Iterator of tokens.
pub struct TokenIter<'w> {
    worker: &'w Worker,
    nodes: &'w [(usize, Node)],
    i: usize,
}

impl<'w> TokenIter<'w> {
    #[inline(always)]
    pub(crate) const fn new(worker: &'w Worker, nodes: &'w [(usize, Node)]) -> Self {
        Self {
            worker,
            nodes,
            i: 0,
        }
    }
}

impl<'w> Iterator for TokenIter<'w> {
    type Item = Token<'w>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.i < self.nodes.len() {
            let t = Token::new(self.worker, self.nodes, self.i);
            self.i += 1;
            Some(t)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.nodes.len() - self.i;
        (n, Some(n))
    }
}

impl ExactSizeIterator for TokenIter<'_> {}

/// An owned, self-contained token.
///
/// This struct is the owned counterpart to [`Token`], returned by the tagger.
/// It can be stored or sent across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    /// Surface string.
    pub surface: String,
    /// Raw feature string from the dictionary.
    pub feature: String,
    /// `feature` decoded with the tagger's schema.
    pub features: Features,
    /// Position range in characters.
    pub range_char: Range<usize>,
    /// Position range in bytes.
    pub range_byte: Range<usize>,
    /// Byte length of the surface.
    pub length: usize,
    /// Byte length including the preceding whitespace.
    pub rlength: usize,
    /// Whitespace skipped before the surface.
    pub white_space: String,
    /// Normal or unknown.
    pub status: NodeStatus,
    /// Lexicon the word comes from.
    pub lex_type: LexType,
    /// Left connection id.
    pub left_id: u16,
    /// Right connection id.
    pub right_id: u16,
    /// Word cost.
    pub word_cost: i16,
    /// Cumulative cost from BOS.
    pub total_cost: i32,
    /// Category id of the first character.
    pub char_type: u32,
}

#[cfg(test)]
mod tests {
    use crate::dictionary::*;
    use crate::feature::{FeatureSchema, Features};
    use crate::token::NodeStatus;
    use crate::tokenizer::*;

    #[test]
    fn test_iter() {
        let lexicon_csv = "自然,0,0,1,sizen
言語,0,0,4,gengo
処理,0,0,3,shori
自然言語,0,0,6,sizengengo
言語処理,0,0,5,gengoshori";
        let matrix_def = "1 1\n0 0 0";
        let char_def = "DEFAULT 0 1 0";
        let unk_def = "DEFAULT,0,0,100,*";

        let dict_inner = SystemDictionaryBuilder::from_readers(
            lexicon_csv.as_bytes(),
            matrix_def.as_bytes(),
            char_def.as_bytes(),
            unk_def.as_bytes(),
        )
        .unwrap();

        let mut buffer = Vec::new();
        dict_inner.write(&mut buffer).unwrap();

        let dict = Dictionary::read(buffer.as_slice()).unwrap();

        let tokenizer = Tokenizer::new(dict);
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("自然言語処理");
        worker.tokenize().unwrap();
        assert_eq!(worker.num_tokens(), 2);

        let mut it = worker.token_iter();
        assert_eq!(it.len(), 2);
        for i in 0..worker.num_tokens() {
            let lhs = worker.token(i);
            let rhs = it.next().unwrap();
            assert_eq!(lhs.surface(), rhs.surface());
        }
        assert!(it.next().is_none());
    }

    #[test]
    fn test_morpheme() {
        let dict_inner = SystemDictionaryBuilder::from_readers(
            "東京,1,1,10,名詞,固有名詞".as_bytes(),
            "2 2\n0 0 0\n0 1 0\n1 0 0\n1 1 0".as_bytes(),
            "DEFAULT 0 1 0\nKANJI 0 0 2\n0x4E00..0x9FFF KANJI".as_bytes(),
            "DEFAULT,0,0,100,記号\nKANJI,1,1,50,名詞".as_bytes(),
        )
        .unwrap();
        let tokenizer = Tokenizer::from_inner(dict_inner);
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("東京都");
        worker.tokenize().unwrap();
        assert_eq!(worker.num_tokens(), 2);

        let m = worker.token(0).to_morpheme(FeatureSchema::Raw).unwrap();
        assert_eq!(m.surface, "東京");
        assert_eq!(m.status, NodeStatus::Normal);
        assert_eq!(m.length, 6);
        assert_eq!(m.rlength, 6);
        assert_eq!(m.word_cost, 10);
        assert_eq!(m.char_type, 1);
        assert_eq!(
            m.features,
            Features::Raw(vec!["名詞".to_string(), "固有名詞".to_string()])
        );

        let t = worker.token(1);
        assert_eq!(t.surface(), "都");
        assert_eq!(t.status(), NodeStatus::Unknown);
        assert_eq!(t.lex_type(), LexType::Unknown);
        assert_eq!(t.total_cost(), 60);
    }
}
