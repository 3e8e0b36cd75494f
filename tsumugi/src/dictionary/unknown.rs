use std::io::Read;

use rkyv::{Archive, Deserialize, Serialize};

use crate::dictionary::character::{CharInfo, CharProperty};
use crate::dictionary::connector::ConnectorView;
use crate::dictionary::lexicon::{Lexicon, WordParam};
use crate::dictionary::{LexType, WordIdx};
use crate::errors::{Result, TsumugiError};
use crate::sentence::Sentence;
use crate::utils::FromU32;

#[derive(Default, Debug, Clone, Eq, PartialEq, Archive, Serialize, Deserialize)]
pub struct UnkEntry {
    pub cate_id: u16,
    pub left_id: u16,
    pub right_id: u16,
    pub word_cost: i16,
    pub feature: String,
}

/// Candidate synthesized for a span that the lexicons may not cover.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct UnkWord {
    start_char: usize,
    end_char: usize,
    left_id: u16,
    right_id: u16,
    word_cost: i16,
    word_id: u32,
}

impl UnkWord {
    #[inline(always)]
    pub const fn start_char(&self) -> usize {
        self.start_char
    }

    #[inline(always)]
    pub const fn end_char(&self) -> usize {
        self.end_char
    }

    #[inline(always)]
    pub const fn word_param(&self) -> WordParam {
        WordParam::new(self.left_id, self.right_id, self.word_cost)
    }

    #[inline(always)]
    pub const fn word_idx(&self) -> WordIdx {
        WordIdx::new(LexType::Unknown, self.word_id)
    }
}

/// Handler of unknown words.
#[derive(Archive, Serialize, Deserialize)]
pub struct UnkHandler {
    offsets: Vec<usize>, // indexed by category id
    entries: Vec<UnkEntry>,
}

impl UnkHandler {
    /// Emits unknown-word candidates starting at `start_char`.
    ///
    /// Nothing is emitted when a lexicon entry matched there and the
    /// character's category does not set INVOKE. Otherwise, a GROUP category
    /// emits the maximal run (if within `max_grouping_len`) and LENGTH emits
    /// the prefixes of 1..=LENGTH characters. A one-character candidate is
    /// emitted when neither applied.
    pub(crate) fn gen_unk_words<F>(
        &self,
        sent: &Sentence,
        start_char: usize,
        has_matched: bool,
        max_grouping_len: Option<usize>,
        mut f: F,
    ) where
        F: FnMut(UnkWord),
    {
        let cinfo = sent.char_info(start_char);
        if has_matched && !cinfo.invoke() {
            return;
        }

        let mut generated = false;
        let groupable = sent.groupable(start_char);

        if cinfo.group() && max_grouping_len.is_none_or(|max| groupable <= max) {
            f = self.scan_entries(start_char, start_char + groupable, cinfo, f);
            generated = true;
        }

        for i in 1..=usize::from(cinfo.length()).min(groupable) {
            if cinfo.group() && i == groupable {
                continue;
            }
            f = self.scan_entries(start_char, start_char + i, cinfo, f);
            generated = true;
        }

        if !generated {
            self.scan_entries(start_char, start_char + 1, cinfo, f);
        }
    }

    #[inline(always)]
    fn scan_entries<F>(&self, start_char: usize, end_char: usize, cinfo: CharInfo, mut f: F) -> F
    where
        F: FnMut(UnkWord),
    {
        let base_id = usize::from_u32(cinfo.base_id());
        let start = self.offsets[base_id];
        let end = self.offsets[base_id + 1];
        for (word_id, e) in self.entries[start..end].iter().enumerate() {
            f(UnkWord {
                start_char,
                end_char,
                left_id: e.left_id,
                right_id: e.right_id,
                word_cost: e.word_cost,
                // offsets are bounded by the entry count, which was checked at load
                word_id: (start + word_id) as u32,
            });
        }
        f
    }

    #[inline(always)]
    pub(crate) fn word_param(&self, word_idx: WordIdx) -> WordParam {
        debug_assert_eq!(word_idx.lex_type, LexType::Unknown);
        let e = &self.entries[usize::from_u32(word_idx.word_id)];
        WordParam::new(e.left_id, e.right_id, e.word_cost)
    }

    #[inline(always)]
    pub(crate) fn word_feature(&self, word_idx: WordIdx) -> &str {
        debug_assert_eq!(word_idx.lex_type, LexType::Unknown);
        &self.entries[usize::from_u32(word_idx.word_id)].feature
    }

    /// Number of entries in `unk.def`.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of categories the entries are grouped by.
    #[inline(always)]
    pub fn num_categories(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Returns the id of the first category that has no entry, if any.
    ///
    /// Every character belongs to some category, so a category without an
    /// entry leaves its characters uncoverable outside the lexicons.
    pub fn uncovered_category(&self) -> Option<usize> {
        self.offsets.windows(2).position(|w| w[0] == w[1])
    }

    /// Checks if left/right-ids are valid with the connector.
    pub fn verify<C>(&self, conn: &C) -> bool
    where
        C: ConnectorView,
    {
        self.entries.iter().all(|e| {
            usize::from(e.left_id) < conn.num_left() && usize::from(e.right_id) < conn.num_right()
        })
    }

    /// Creates a new instance from `unk.def`.
    pub fn from_reader<R>(mut rdr: R, char_prop: &CharProperty) -> Result<Self>
    where
        R: Read,
    {
        let mut buf = vec![];
        rdr.read_to_end(&mut buf)?;

        let parsed = Lexicon::parse_csv(&buf, "unk.def")?;
        let mut map = vec![vec![]; char_prop.num_categories()];
        for item in parsed {
            let cate_id = char_prop.cate_id(&item.surface).ok_or_else(|| {
                let msg = format!("Undefined category: {}", item.surface);
                TsumugiError::invalid_format("unk.def", msg)
            })?;
            let e = UnkEntry {
                cate_id: u16::try_from(cate_id)?,
                left_id: item.param.left_id,
                right_id: item.param.right_id,
                word_cost: item.param.word_cost,
                feature: item.feature.to_string(),
            };
            map[usize::from_u32(cate_id)].push(e);
        }

        let mut offsets = vec![];
        let mut entries = vec![];
        for mut v in map {
            offsets.push(entries.len());
            entries.append(&mut v);
        }
        offsets.push(entries.len());
        u32::try_from(entries.len())?;

        let handler = Self { offsets, entries };
        if let Some(cate_id) = handler.uncovered_category() {
            let name = u32::try_from(cate_id)
                .ok()
                .and_then(|id| char_prop.cate_str(id))
                .unwrap_or_default();
            let msg = format!("cannot find UNK category: {name}");
            return Err(TsumugiError::invalid_format("unk.def", msg));
        }
        Ok(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gen_spans(char_def: &str, unk_def: &str, input: &str, max: Option<usize>) -> Vec<(usize, usize)> {
        let prop = CharProperty::from_reader(char_def.as_bytes()).unwrap();
        let unk = UnkHandler::from_reader(unk_def.as_bytes(), &prop).unwrap();
        let mut sent = Sentence::new();
        sent.set_sentence(input);
        sent.compile(&prop);
        let mut spans = vec![];
        unk.gen_unk_words(&sent, 0, false, max, |w| {
            spans.push((w.start_char(), w.end_char()))
        });
        spans
    }

    #[test]
    fn test_basic() {
        let char_def = "DEFAULT 0 1 0\nSPACE 0 1 0\nALPHA 1 1 0";
        let unk_def = "DEFAULT,0,2,1,補助記号\nALPHA,1,0,-4,名詞\nALPHA,2,2,3,Meishi\nSPACE,0,0,0,空白";
        let prop = CharProperty::from_reader(char_def.as_bytes()).unwrap();
        let unk = UnkHandler::from_reader(unk_def.as_bytes(), &prop).unwrap();
        assert_eq!(unk.offsets, vec![0, 1, 2, 4]);
        assert_eq!(unk.len(), 4);
        assert_eq!(unk.uncovered_category(), None);
        assert_eq!(
            unk.entries[3],
            UnkEntry {
                cate_id: 2,
                left_id: 2,
                right_id: 2,
                word_cost: 3,
                feature: "Meishi".to_string(),
            }
        );
    }

    #[test]
    fn test_group_and_length() {
        let char_def = "DEFAULT 0 1 0\nNUMERIC 1 1 2\n0x0030..0x0039 NUMERIC";
        let unk_def = "DEFAULT,0,0,10,記号\nNUMERIC,0,0,20,数詞";
        assert_eq!(
            gen_spans(char_def, unk_def, "12345", None),
            vec![(0, 5), (0, 1), (0, 2)]
        );
    }

    #[test]
    fn test_group_covers_length() {
        let char_def = "DEFAULT 0 1 0\nNUMERIC 1 1 3\n0x0030..0x0039 NUMERIC";
        let unk_def = "DEFAULT,0,0,10,記号\nNUMERIC,0,0,20,数詞";
        assert_eq!(gen_spans(char_def, unk_def, "12", None), vec![(0, 2), (0, 1)]);
    }

    #[test]
    fn test_max_grouping_len() {
        let char_def = "DEFAULT 0 1 0\nNUMERIC 1 1 0\n0x0030..0x0039 NUMERIC";
        let unk_def = "DEFAULT,0,0,10,記号\nNUMERIC,0,0,20,数詞";
        assert_eq!(gen_spans(char_def, unk_def, "12345", Some(3)), vec![(0, 1)]);
        assert_eq!(gen_spans(char_def, unk_def, "12345", Some(5)), vec![(0, 5)]);
    }

    #[test]
    fn test_no_invoke_after_match() {
        let char_def = "DEFAULT 0 1 0\nNUMERIC 1 1 0\n0x0030..0x0039 NUMERIC";
        let unk_def = "DEFAULT,0,0,10,記号\nNUMERIC,0,0,20,数詞";
        let prop = CharProperty::from_reader(char_def.as_bytes()).unwrap();
        let unk = UnkHandler::from_reader(unk_def.as_bytes(), &prop).unwrap();
        let mut sent = Sentence::new();
        sent.set_sentence("a1");
        sent.compile(&prop);
        let mut n = 0;
        unk.gen_unk_words(&sent, 0, true, None, |_| n += 1);
        assert_eq!(n, 0);
        unk.gen_unk_words(&sent, 1, true, None, |_| n += 1);
        assert_eq!(n, 1);
    }

    #[test]
    fn test_few_cols() {
        let char_def = "DEFAULT 0 1 0";
        let unk_def = "DEFAULT,0,2";
        let prop = CharProperty::from_reader(char_def.as_bytes()).unwrap();
        let result = UnkHandler::from_reader(unk_def.as_bytes(), &prop);
        assert!(result.is_err());
    }

    #[test]
    fn test_category_without_entry() {
        let char_def = "DEFAULT 0 1 0\nKANJI 0 0 2\n0x4E00..0x9FFF KANJI";
        let unk_def = "DEFAULT,0,0,100,*";
        let prop = CharProperty::from_reader(char_def.as_bytes()).unwrap();
        let err = UnkHandler::from_reader(unk_def.as_bytes(), &prop)
            .err()
            .unwrap();
        assert!(matches!(err, TsumugiError::InvalidFormat(_)));
        assert!(err.to_string().contains("KANJI"));
    }

    #[test]
    fn test_invalid_cate() {
        let char_def = "DEFAULT 0 1 0";
        let unk_def = "INVALID,0,2,1,補助記号";
        let prop = CharProperty::from_reader(char_def.as_bytes()).unwrap();
        let result = UnkHandler::from_reader(unk_def.as_bytes(), &prop);
        assert!(result.is_err());
    }
}
