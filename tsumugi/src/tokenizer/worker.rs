//! Provider of a routine for tokenization.
use crate::errors::{NoPathError, Result, TsumugiError};
use crate::sentence::Sentence;
use crate::token::{Token, TokenIter};
use crate::tokenizer::Tokenizer;
use crate::tokenizer::lattice::{Lattice, LatticeNBest, TopNodes};

/// Provider of a routine for tokenization.
///
/// It holds the internal data structures used in tokenization,
/// which can be reused to avoid unnecessary memory reallocation.
pub struct Worker {
    pub(crate) tokenizer: Tokenizer,
    pub(crate) sent: Sentence,
    lattice: Lattice,
    lattice_nbest: LatticeNBest,
    pub(crate) top_nodes: TopNodes,
    top_cost: i32,
    pub(crate) nbest_paths: Vec<(TopNodes, i32)>,
}

impl Worker {
    /// Creates a new instance.
    pub(crate) fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            sent: Sentence::new(),
            lattice: Lattice::default(),
            lattice_nbest: LatticeNBest::default(),
            top_nodes: vec![],
            top_cost: 0,
            nbest_paths: vec![],
        }
    }

    /// Resets the input sentence to be tokenized.
    pub fn reset_sentence<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.top_nodes.clear();
        self.top_cost = 0;
        self.nbest_paths.clear();
        self.sent.set_sentence(input);
        self.sent.compile(self.tokenizer.dict_inner().char_prop());
    }

    /// Tokenizes the input sentence set by [`Self::reset_sentence`].
    ///
    /// # Errors
    ///
    /// [`TsumugiError::NoPath`] is returned when no path reaches the end of the
    /// input, which happens only if the dictionary leaves some character
    /// category without unknown-word entries.
    pub fn tokenize(&mut self) -> Result<()> {
        self.top_nodes.clear();
        self.tokenizer.build_lattice(&self.sent, &mut self.lattice);
        match self.lattice.append_top_nodes(&mut self.top_nodes) {
            Some(cost) => {
                self.top_cost = cost;
                Ok(())
            }
            None => Err(self.no_path(self.lattice.furthest_reached())),
        }
    }

    /// Tokenizes the sentence and keeps up to `n` best paths.
    ///
    /// After calling this, the results can be accessed via
    /// [`Self::num_nbest_paths`], [`Self::path_cost`] and
    /// [`Self::nbest_token_iter`]. Fewer than `n` paths are kept if the
    /// lattice does not have that many.
    ///
    /// # Errors
    ///
    /// [`TsumugiError::InvalidArgument`] is returned when `n` is 0, and
    /// [`TsumugiError::NoPath`] as for [`Self::tokenize`].
    pub fn tokenize_nbest(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(TsumugiError::invalid_argument("n", "must be positive"));
        }
        self.nbest_paths.clear();
        self.lattice_nbest.set_k(n);
        self.tokenizer
            .build_lattice(&self.sent, &mut self.lattice_nbest);
        self.lattice_nbest.append_nbest_paths(&mut self.nbest_paths);
        if self.nbest_paths.is_empty() {
            // The 1-best lattice knows how far the input was covered.
            self.tokenizer.build_lattice(&self.sent, &mut self.lattice);
            return Err(self.no_path(self.lattice.furthest_reached()));
        }
        Ok(())
    }

    fn no_path(&self, position: usize) -> TsumugiError {
        TsumugiError::NoPath(NoPathError {
            len_char: self.sent.len_char(),
            position,
        })
    }

    /// Gets the number of resultant tokens.
    #[inline(always)]
    pub fn num_tokens(&self) -> usize {
        self.top_nodes.len()
    }

    /// Gets the `i`-th resultant token.
    #[inline(always)]
    pub fn token(&self, i: usize) -> Token<'_> {
        Token::new(self, &self.top_nodes, i)
    }

    /// Creates an iterator of resultant tokens.
    #[inline(always)]
    pub fn token_iter(&self) -> TokenIter<'_> {
        TokenIter::new(self, &self.top_nodes)
    }

    /// Total cost of the 1-best path, connections to BOS and EOS included.
    #[inline(always)]
    pub const fn total_cost(&self) -> i32 {
        self.top_cost
    }

    /// Returns the number of N-best paths found.
    pub fn num_nbest_paths(&self) -> usize {
        self.nbest_paths.len()
    }

    /// Returns the total cost of the path at `path_idx`.
    pub fn path_cost(&self, path_idx: usize) -> Option<i32> {
        self.nbest_paths.get(path_idx).map(|(_, cost)| *cost)
    }

    /// Returns an iterator over the tokens in the N-best path at `path_idx`.
    pub fn nbest_token_iter(&self, path_idx: usize) -> Option<TokenIter<'_>> {
        self.nbest_paths
            .get(path_idx)
            .map(|(nodes, _)| TokenIter::new(self, nodes))
    }
}
