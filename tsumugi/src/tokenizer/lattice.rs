use crate::common::{BOS_EOS_CONNECTION_ID, MAX_SENTENCE_LENGTH};
use crate::dictionary::LexType;
use crate::dictionary::connector::ConnectorCost;
use crate::dictionary::lexicon::WordParam;
use crate::dictionary::word_idx::WordIdx;

const MAX_COST: i32 = i32::MAX;
const INVALID_IDX: usize = usize::MAX;

/// A node in the lattice.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub word_id: u32,
    pub lex_type: LexType,
    pub lex_id: u16,
    pub start_node: usize,
    pub start_word: usize,
    pub left_id: u16,
    pub right_id: u16,
    /// Index of the best predecessor in `ends[start_node]`.
    pub min_idx: usize,
    /// Cumulative cost from BOS, this word's cost included.
    pub min_cost: i32,
}

impl Node {
    fn bos() -> Self {
        Self {
            word_id: u32::MAX,
            lex_type: LexType::default(),
            lex_id: 0,
            start_node: MAX_SENTENCE_LENGTH,
            start_word: MAX_SENTENCE_LENGTH,
            left_id: u16::MAX,
            right_id: BOS_EOS_CONNECTION_ID,
            min_idx: INVALID_IDX,
            min_cost: 0,
        }
    }

    fn eos(start_node: usize, len_char: usize) -> Self {
        Self {
            word_id: u32::MAX,
            lex_type: LexType::default(),
            lex_id: 0,
            start_node,
            start_word: len_char,
            left_id: BOS_EOS_CONNECTION_ID,
            right_id: u16::MAX,
            min_idx: INVALID_IDX,
            min_cost: MAX_COST,
        }
    }

    fn word(start_node: usize, start_word: usize, word_idx: WordIdx, param: WordParam) -> Self {
        Self {
            word_id: word_idx.word_id,
            lex_type: word_idx.lex_type,
            lex_id: word_idx.lex_id,
            start_node,
            start_word,
            left_id: param.left_id,
            right_id: param.right_id,
            min_idx: INVALID_IDX,
            min_cost: MAX_COST,
        }
    }

    #[inline(always)]
    pub fn word_idx(&self) -> WordIdx {
        WordIdx::with_lex_id(self.lex_type, self.lex_id, self.word_id)
    }

    #[inline(always)]
    pub fn is_connected_to_bos(&self) -> bool {
        self.min_cost != MAX_COST
    }

    #[inline(always)]
    pub fn is_bos(&self) -> bool {
        self.start_node == MAX_SENTENCE_LENGTH
    }
}

/// A resultant path: `(end_char, node)` pairs from BOS side to EOS side and
/// the total cost of reaching EOS.
pub type TopNodes = Vec<(usize, Node)>;

/// Common interface of the lattices filled by the tokenizer.
pub trait LatticeBuild {
    fn reset(&mut self, len_char: usize);

    /// Checks if there exist at least one node ending at the position.
    fn has_previous_node(&self, i: usize) -> bool;

    fn insert_node<C>(
        &mut self,
        start_node: usize,
        start_word: usize,
        end_word: usize,
        word_idx: WordIdx,
        word_param: WordParam,
        connector: &C,
    ) where
        C: ConnectorCost;

    fn insert_eos<C>(&mut self, start_node: usize, connector: &C)
    where
        C: ConnectorCost;
}

fn reset_vec<T>(data: &mut Vec<Vec<T>>, new_len: usize) {
    for v in data.iter_mut() {
        v.clear();
    }
    let cur_len = data.len();
    if cur_len <= new_len {
        data.reserve(new_len - cur_len);
        for _ in cur_len..new_len {
            data.push(Vec::with_capacity(16))
        }
    }
}

/// Lattice for the 1-best path.
#[derive(Default)]
pub struct Lattice {
    ends: Vec<Vec<Node>>,
    eos: Option<Node>,
    len_char: usize, // needed for avoiding to free ends
}

impl Lattice {
    #[inline(always)]
    pub const fn len_char(&self) -> usize {
        self.len_char
    }

    /// Returns the position of the best predecessor and the cost of reaching
    /// `left_id` from it, or `None` if nothing ends at `start_node`.
    fn search_min_node<C>(
        &self,
        start_node: usize,
        left_id: u16,
        connector: &C,
    ) -> Option<(usize, i32)>
    where
        C: ConnectorCost,
    {
        let mut best = None;
        let mut min_cost = MAX_COST;
        for (i, left_node) in self.ends[start_node].iter().enumerate() {
            debug_assert!(left_node.is_connected_to_bos());
            let conn_cost = connector.cost(left_node.right_id, left_id);
            let new_cost = left_node.min_cost.saturating_add(conn_cost);
            // Strict < keeps the first inserted predecessor on ties.
            if best.is_none() || new_cost < min_cost {
                best = Some(i);
                min_cost = new_cost;
            }
        }
        best.map(|i| (i, min_cost))
    }

    /// Collects the best path, or `None` if EOS is unreachable.
    pub fn append_top_nodes(&self, top_nodes: &mut TopNodes) -> Option<i32> {
        let eos = self.eos.as_ref().filter(|eos| eos.is_connected_to_bos())?;
        let mut end_node = eos.start_node;
        let mut min_idx = eos.min_idx;
        while end_node != 0 {
            let node = &self.ends[end_node][min_idx];
            top_nodes.push((end_node, *node));
            (end_node, min_idx) = (node.start_node, node.min_idx);
        }
        debug_assert!(self.ends[0][min_idx].is_bos());
        top_nodes.reverse();
        Some(eos.min_cost)
    }

    /// Returns the furthest position that some path from BOS reaches.
    pub fn furthest_reached(&self) -> usize {
        (0..=self.len_char)
            .rev()
            .find(|&i| self.has_previous_node(i))
            .unwrap_or(0)
    }
}

impl LatticeBuild for Lattice {
    fn reset(&mut self, len_char: usize) {
        reset_vec(&mut self.ends, len_char + 1);
        self.len_char = len_char;
        self.eos = None;
        self.ends[0].push(Node::bos());
    }

    #[inline(always)]
    fn has_previous_node(&self, i: usize) -> bool {
        self.ends.get(i).is_some_and(|d| !d.is_empty())
    }

    fn insert_node<C>(
        &mut self,
        start_node: usize,
        start_word: usize,
        end_word: usize,
        word_idx: WordIdx,
        word_param: WordParam,
        connector: &C,
    ) where
        C: ConnectorCost,
    {
        debug_assert!(start_node <= start_word);
        debug_assert!(start_word < end_word);
        let Some((min_idx, min_cost)) =
            self.search_min_node(start_node, word_param.left_id, connector)
        else {
            return;
        };
        let mut node = Node::word(start_node, start_word, word_idx, word_param);
        node.min_idx = min_idx;
        node.min_cost = min_cost.saturating_add(i32::from(word_param.word_cost));
        self.ends[end_word].push(node);
    }

    fn insert_eos<C>(&mut self, start_node: usize, connector: &C)
    where
        C: ConnectorCost,
    {
        let mut eos = Node::eos(start_node, self.len_char);
        if let Some((min_idx, min_cost)) =
            self.search_min_node(start_node, BOS_EOS_CONNECTION_ID, connector)
        {
            eos.min_idx = min_idx;
            eos.min_cost = min_cost;
        }
        self.eos = Some(eos);
    }
}

impl std::fmt::Debug for Lattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Lattice {{ eos: {:?}, ends: [", &self.eos)?;
        for (i, e) in self.ends[..=self.len_char()].iter().enumerate() {
            writeln!(f, "{i} => {e:?}")?;
        }
        writeln!(f, "]}}")
    }
}

/// One of the k best ways of reaching a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Record {
    /// Cumulative cost from BOS, this word's cost included.
    cost: i32,
    /// Index of the predecessor in `ends[start_node]`.
    lnode: usize,
    /// Which of the predecessor's records this extends.
    lrank: usize,
}

#[derive(Debug)]
struct NodeNBest {
    node: Node,
    records: Vec<Record>,
}

/// Lattice keeping up to `k` best records per node.
///
/// Records are ordered by cost, ties going to the first inserted predecessor
/// as in [`Lattice`], so the first record always follows the 1-best path.
#[derive(Default)]
pub struct LatticeNBest {
    ends: Vec<Vec<NodeNBest>>,
    eos: Option<NodeNBest>,
    len_char: usize,
    k: usize,
    candidates: Vec<Record>,
}

impl LatticeNBest {
    pub fn set_k(&mut self, k: usize) {
        self.k = k;
    }

    fn compute_records<C>(
        &mut self,
        start_node: usize,
        left_id: u16,
        word_cost: i16,
        connector: &C,
    ) -> Vec<Record>
    where
        C: ConnectorCost,
    {
        self.candidates.clear();
        for (i, lnode) in self.ends[start_node].iter().enumerate() {
            let conn_cost = connector.cost(lnode.node.right_id, left_id);
            for (r, rec) in lnode.records.iter().enumerate() {
                self.candidates.push(Record {
                    cost: rec
                        .cost
                        .saturating_add(conn_cost)
                        .saturating_add(i32::from(word_cost)),
                    lnode: i,
                    lrank: r,
                });
            }
        }
        self.candidates
            .sort_unstable_by_key(|c| (c.cost, c.lnode, c.lrank));
        self.candidates.iter().take(self.k).copied().collect()
    }

    /// Collects up to `k` distinct paths in non-decreasing cost order.
    pub fn append_nbest_paths(&self, paths: &mut Vec<(TopNodes, i32)>) {
        let Some(eos) = self.eos.as_ref() else {
            return;
        };
        for rec in &eos.records {
            let mut top_nodes = vec![];
            let mut end_node = eos.node.start_node;
            let (mut idx, mut rank) = (rec.lnode, rec.lrank);
            while end_node != 0 {
                let n = &self.ends[end_node][idx];
                let r = n.records[rank];
                let mut node = n.node;
                node.min_idx = r.lnode;
                node.min_cost = r.cost;
                top_nodes.push((end_node, node));
                (end_node, idx, rank) = (node.start_node, r.lnode, r.lrank);
            }
            top_nodes.reverse();
            paths.push((top_nodes, rec.cost));
        }
    }
}

impl LatticeBuild for LatticeNBest {
    fn reset(&mut self, len_char: usize) {
        reset_vec(&mut self.ends, len_char + 1);
        self.len_char = len_char;
        self.eos = None;
        self.ends[0].push(NodeNBest {
            node: Node::bos(),
            records: vec![Record {
                cost: 0,
                lnode: INVALID_IDX,
                lrank: 0,
            }],
        });
    }

    #[inline(always)]
    fn has_previous_node(&self, i: usize) -> bool {
        self.ends.get(i).is_some_and(|d| !d.is_empty())
    }

    fn insert_node<C>(
        &mut self,
        start_node: usize,
        start_word: usize,
        end_word: usize,
        word_idx: WordIdx,
        word_param: WordParam,
        connector: &C,
    ) where
        C: ConnectorCost,
    {
        debug_assert!(start_node <= start_word);
        debug_assert!(start_word < end_word);
        let records =
            self.compute_records(start_node, word_param.left_id, word_param.word_cost, connector);
        let Some(best) = records.first() else {
            return;
        };
        let mut node = Node::word(start_node, start_word, word_idx, word_param);
        node.min_idx = best.lnode;
        node.min_cost = best.cost;
        self.ends[end_word].push(NodeNBest { node, records });
    }

    fn insert_eos<C>(&mut self, start_node: usize, connector: &C)
    where
        C: ConnectorCost,
    {
        let records = self.compute_records(start_node, BOS_EOS_CONNECTION_ID, 0, connector);
        let mut node = Node::eos(start_node, self.len_char);
        if let Some(best) = records.first() {
            node.min_idx = best.lnode;
            node.min_cost = best.cost;
        }
        self.eos = Some(NodeNBest { node, records });
    }
}
