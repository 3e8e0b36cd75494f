use crate::dictionary::character::{CharInfo, CharProperty};

/// Per-input character data shared by lattice construction and decoding.
#[derive(Default, Clone, Debug)]
pub struct Sentence {
    input: String,
    chars: Vec<char>,
    c2b: Vec<usize>,
    cinfos: Vec<CharInfo>,
    groupable: Vec<usize>,
}

impl Sentence {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.input.clear();
        self.chars.clear();
        self.c2b.clear();
        self.cinfos.clear();
        self.groupable.clear();
    }

    /// Sets a new input. [`Self::compile`] must be called before use.
    pub fn set_sentence<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.clear();
        self.input.push_str(input.as_ref());
    }

    pub fn compile(&mut self, char_prop: &CharProperty) {
        self.compute_basic();
        self.compute_categories(char_prop);
        self.compute_groupable();
    }

    fn compute_basic(&mut self) {
        for (bi, ch) in self.input.char_indices() {
            self.chars.push(ch);
            self.c2b.push(bi);
        }
        self.c2b.push(self.input.len());
    }

    fn compute_categories(&mut self, char_prop: &CharProperty) {
        self.cinfos.reserve(self.chars.len());
        for &c in &self.chars {
            self.cinfos.push(char_prop.char_info(c));
        }
    }

    // groupable[i] is the length of the longest run starting at i whose
    // adjacent characters share at least one category.
    fn compute_groupable(&mut self) {
        debug_assert_eq!(self.chars.len(), self.cinfos.len());

        let Some(last) = self.cinfos.last() else {
            return;
        };
        self.groupable.resize(self.chars.len(), 1);
        let mut rhs = last.cate_idset();

        for i in (1..self.chars.len()).rev() {
            let lhs = self.cinfos[i - 1].cate_idset();
            if (lhs & rhs) != 0 {
                self.groupable[i - 1] = self.groupable[i] + 1;
            }
            rhs = lhs;
        }
    }

    #[inline(always)]
    pub fn raw(&self) -> &str {
        &self.input
    }

    #[inline(always)]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    #[inline(always)]
    pub fn len_char(&self) -> usize {
        self.chars.len()
    }

    #[inline(always)]
    pub fn byte_position(&self, pos_char: usize) -> usize {
        self.c2b[pos_char]
    }

    #[inline(always)]
    pub fn char_info(&self, pos_char: usize) -> CharInfo {
        self.cinfos[pos_char]
    }

    #[inline(always)]
    pub fn groupable(&self, pos_char: usize) -> usize {
        self.groupable[pos_char]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence() {
        let mut sent = Sentence::new();
        sent.set_sentence("自然");
        sent.compute_basic();
        assert_eq!(sent.chars(), &['自', '然']);
        assert_eq!(sent.byte_position(0), 0);
        assert_eq!(sent.byte_position(1), 3);
        assert_eq!(sent.byte_position(2), 6);
    }

    #[test]
    fn test_groupable() {
        let char_def = "DEFAULT 0 1 0\nNUMERIC 1 1 0\nALPHA 1 1 0\n\
                        0x0030..0x0039 NUMERIC\n0x0041..0x005A ALPHA";
        let prop = CharProperty::from_reader(char_def.as_bytes()).unwrap();
        let mut sent = Sentence::new();
        sent.set_sentence("12AB3");
        sent.compile(&prop);
        assert_eq!(sent.len_char(), 5);
        assert_eq!(
            (0..5).map(|i| sent.groupable(i)).collect::<Vec<_>>(),
            vec![2, 1, 2, 1, 1]
        );
    }

    #[test]
    fn test_empty() {
        let prop = CharProperty::from_reader("DEFAULT 0 1 0".as_bytes()).unwrap();
        let mut sent = Sentence::new();
        sent.set_sentence("");
        sent.compile(&prop);
        assert_eq!(sent.len_char(), 0);
        assert_eq!(sent.byte_position(0), 0);
    }
}
