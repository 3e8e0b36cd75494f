//! Common settings in Tsumugi.

/// The maximum length of an input sentence in characters.
///
/// The value is also used as the start position of BOS nodes.
pub const MAX_SENTENCE_LENGTH: usize = usize::MAX;

/// The fixed connection id of BOS/EOS.
pub const BOS_EOS_CONNECTION_ID: u16 = 0;

/// Character encoding of every dictionary this crate reads or writes.
pub const DICTIONARY_CHARSET: &str = "UTF-8";
