//! Compilation of system dictionaries from MeCab-format sources.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use crate::dictionary::connector::{ConnectorView, MatrixConnector};
use crate::dictionary::lexicon::RawWordEntry;
use crate::dictionary::{CharProperty, DictionaryInner, LexType, Lexicon, UnkHandler};
use crate::errors::{Result, TsumugiError};

/// Builder of [`DictionaryInner`] from MeCab-format sources.
pub struct SystemDictionaryBuilder {}

impl SystemDictionaryBuilder {
    pub(crate) fn build(
        system_word_entries: &[RawWordEntry],
        connector: MatrixConnector,
        char_prop: CharProperty,
        unk_handler: UnkHandler,
    ) -> Result<DictionaryInner> {
        if connector.num_left() == 0 || connector.num_right() == 0 {
            return Err(TsumugiError::invalid_argument(
                "connector_rdr",
                "matrix.def must define the BOS/EOS connection id 0.",
            ));
        }

        let system_lexicon = Lexicon::from_entries(system_word_entries, LexType::System)?;

        if !system_lexicon.verify(&connector) {
            return Err(TsumugiError::invalid_argument(
                "system_lexicon_rdr",
                "system_lexicon_rdr includes invalid connection ids.",
            ));
        }
        if !unk_handler.verify(&connector) {
            return Err(TsumugiError::invalid_argument(
                "unk_handler_rdr",
                "unk_handler_rdr includes invalid connection ids.",
            ));
        }

        Ok(DictionaryInner {
            system_lexicon,
            user_lexicons: vec![],
            connector,
            char_prop,
            unk_handler,
        })
    }

    /// Creates a new [`DictionaryInner`] from system entries in the MeCab format.
    ///
    /// # Arguments
    ///
    ///  - `system_lexicon_rdr`: A reader of a lexicon file `*.csv`.
    ///  - `connector_rdr`: A reader of matrix file `matrix.def`.
    ///  - `char_prop_rdr`: A reader of character definition file `char.def`.
    ///  - `unk_handler_rdr`: A reader of unknown definition file `unk.def`.
    ///
    /// # Errors
    ///
    /// [`TsumugiError`] is returned when an input format is invalid.
    pub fn from_readers<S, C, P, U>(
        mut system_lexicon_rdr: S,
        connector_rdr: C,
        char_prop_rdr: P,
        unk_handler_rdr: U,
    ) -> Result<DictionaryInner>
    where
        S: Read,
        C: Read,
        P: Read,
        U: Read,
    {
        let mut system_lexicon_buf = vec![];
        system_lexicon_rdr.read_to_end(&mut system_lexicon_buf)?;
        let system_word_entries = Lexicon::parse_csv(&system_lexicon_buf, "lex.csv")?;
        let connector = MatrixConnector::from_reader(connector_rdr)?;
        let char_prop = CharProperty::from_reader(char_prop_rdr)?;
        let unk_handler = UnkHandler::from_reader(unk_handler_rdr, &char_prop)?;

        Self::build(&system_word_entries, connector, char_prop, unk_handler)
    }

    /// Creates a new [`DictionaryInner`] from a directory holding `matrix.def`,
    /// `char.def`, `unk.def` and any number of `*.csv` lexicon files.
    ///
    /// Lexicon files are read in file-name order, so word ids are stable
    /// across runs.
    pub fn from_dir<P>(dir: P) -> Result<DictionaryInner>
    where
        P: AsRef<Path>,
    {
        let dir = dir.as_ref();

        let mut csv_paths = vec![];
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
                csv_paths.push(path);
            }
        }
        csv_paths.sort();

        let mut bufs = Vec::with_capacity(csv_paths.len());
        for path in &csv_paths {
            bufs.push(fs::read(path)?);
        }
        let mut system_word_entries = vec![];
        for buf in &bufs {
            system_word_entries.extend(Lexicon::parse_csv(buf, "lex.csv")?);
        }

        let connector = MatrixConnector::from_reader(File::open(dir.join("matrix.def"))?)?;
        let char_prop = CharProperty::from_reader(File::open(dir.join("char.def"))?)?;
        let unk_handler = UnkHandler::from_reader(File::open(dir.join("unk.def"))?, &char_prop)?;

        Self::build(&system_word_entries, connector, char_prop, unk_handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oor_lex() {
        let lexicon_csv = "自然,1,1,0,*";
        let matrix_def = "1 1\n0 0 0";
        let char_def = "DEFAULT 0 1 0";
        let unk_def = "DEFAULT,0,0,100,*";

        let result = SystemDictionaryBuilder::from_readers(
            lexicon_csv.as_bytes(),
            matrix_def.as_bytes(),
            char_def.as_bytes(),
            unk_def.as_bytes(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_oor_unk() {
        let lexicon_csv = "自然,0,0,0,*";
        let matrix_def = "1 1\n0 0 0";
        let char_def = "DEFAULT 0 1 0";
        let unk_def = "DEFAULT,1,1,100,*";

        let result = SystemDictionaryBuilder::from_readers(
            lexicon_csv.as_bytes(),
            matrix_def.as_bytes(),
            char_def.as_bytes(),
            unk_def.as_bytes(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_empty_matrix() {
        let result = SystemDictionaryBuilder::from_readers(
            "自然,0,0,0,*".as_bytes(),
            "0 0".as_bytes(),
            "DEFAULT 0 1 0".as_bytes(),
            "".as_bytes(),
        );

        assert!(result.is_err());
    }
}
