//! Tagger facade: construction from options, resource files and dictionary
//! directories, and tokenization into owned morphemes.
pub mod config;
mod output;
mod rc;

use std::env;
use std::path::{Path, PathBuf};

use crate::dictionary::{Dictionary, DictionaryInfo};
use crate::errors::{InitializationError, InvalidInputError, Result, TsumugiError};
use crate::feature::FeatureSchema;
use crate::tagger::config::{OutputFormat, TaggerConfig};
use crate::tagger::rc::RcFile;
use crate::token::{Morpheme, NodeStatus};
use crate::tokenizer::Tokenizer;
use crate::tokenizer::worker::Worker;

/// Environment variable naming the resource file.
pub const RCFILE_ENV: &str = "TSUMUGIRC";
/// Environment variable naming the dictionary directory.
pub const DICDIR_ENV: &str = "TSUMUGI_DICDIR";
/// Resource file looked up in the home directory.
pub const HOME_RCFILE: &str = ".tsumugirc";
/// Resource file looked up in the dictionary directory.
pub const DICRC_FILE: &str = "dicrc";

/// Text tokenized once at construction to detect the feature schema.
pub const PROBE_TEXT: &str = "東京都に住んでいる。";

/// A configured tokenizer returning owned, decoded morphemes.
///
/// A tagger is immutable after construction. It can be shared across threads;
/// each call uses its own lattice.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use tsumugi::Tagger;
///
/// let tagger = Tagger::from_args("-d /usr/local/lib/tsumugi/dic/unidic")?;
/// for m in tagger.tokenize("東京都に住む")? {
///     println!("{}\t{:?}", m.surface, m.features.pos());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Tagger {
    tokenizer: Tokenizer,
    schema: FeatureSchema,
    output_format: OutputFormat,
}

impl Tagger {
    /// Creates a tagger.
    ///
    /// # Errors
    ///
    /// An error for which [`TsumugiError::is_initialization`] holds is returned
    /// when no dictionary is found, a dictionary or resource file is malformed,
    /// or an option is invalid. [`TsumugiError::SchemaMismatch`] is returned
    /// when no schema is configured and the dictionary's feature arity is not
    /// one of the known ones.
    pub fn new(mut config: TaggerConfig) -> Result<Self> {
        if let Some(rc) = find_rcfile(&config)? {
            log::debug!("[tsumugi] Using resource file {}", rc.path().display());
            let unknown = rc
                .apply_to(&mut config)
                .map_err(|e| invalid_rcfile(rc.path(), &e))?;
            for key in unknown {
                log::warn!(
                    "[tsumugi] Ignoring unknown key {key:?} in {}",
                    rc.path().display()
                );
            }
        }

        if config.dicdir.is_none() {
            config.dicdir = env::var_os(DICDIR_ENV).map(PathBuf::from);
        }
        if let Some(dicdir) = &config.dicdir {
            let dicrc_path = dicdir.join(DICRC_FILE);
            if dicrc_path.is_file() {
                let dicrc =
                    RcFile::from_path(&dicrc_path).map_err(|e| invalid_rcfile(&dicrc_path, &e))?;
                let unknown = dicrc
                    .apply_to(&mut config)
                    .map_err(|e| invalid_rcfile(&dicrc_path, &e))?;
                log::debug!(
                    "[tsumugi] Read {} ({} keys not used by the tagger)",
                    dicrc_path.display(),
                    unknown.len()
                );
            }
        }

        let mut dict = load_system_dictionary(&config)?;
        for userdic in &config.userdics {
            dict.add_user_lexicon_from_path(userdic)?;
        }

        let tokenizer = Tokenizer::new(dict)
            .ignore_space(config.ignore_space.unwrap_or(false))
            .map_err(|e| {
                InitializationError::new("ignore-space is not supported by this dictionary")
                    .checked(e.to_string())
                    .hint("define a SPACE category in char.def, or drop -S/ignore-space")
            })?
            .max_grouping_len(config.max_grouping_len.unwrap_or(0));

        let schema = match config.schema {
            Some(schema) => schema,
            None => detect_schema(&tokenizer)?,
        };

        Ok(Self {
            tokenizer,
            schema,
            output_format: config.output_format.unwrap_or_default(),
        })
    }

    /// Creates a tagger from a MeCab-style option string.
    ///
    /// See [`TaggerConfig::from_args`].
    pub fn from_args(args: &str) -> Result<Self> {
        Self::new(TaggerConfig::from_args(args)?)
    }

    /// Schema used to decode features.
    pub const fn schema(&self) -> FeatureSchema {
        self.schema
    }

    /// Format rendered by [`Self::parse`].
    pub const fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Tokenizes `text` into the 1-best sequence of morphemes.
    ///
    /// # Errors
    ///
    /// [`TsumugiError::NoPath`] or [`TsumugiError::SchemaMismatch`].
    pub fn tokenize(&self, text: &str) -> Result<Vec<Morpheme>> {
        let mut worker = self.tokenizer.new_worker();
        worker.reset_sentence(text);
        worker.tokenize()?;
        worker
            .token_iter()
            .map(|t| t.to_morpheme(self.schema))
            .collect()
    }

    /// Tokenizes raw bytes, which must be UTF-8.
    ///
    /// # Errors
    ///
    /// [`TsumugiError::InvalidInput`] is returned, before any tokenization, when
    /// `bytes` is not valid UTF-8.
    pub fn tokenize_bytes(&self, bytes: &[u8]) -> Result<Vec<Morpheme>> {
        self.tokenize(decode_utf8(bytes)?)
    }

    /// Tokenizes `text` into up to `k` sequences in non-decreasing cost order.
    ///
    /// Fewer sequences are returned when the lattice has fewer paths.
    pub fn tokenize_n(&self, text: &str, k: usize) -> Result<Vec<Vec<Morpheme>>> {
        let worker = self.nbest_worker(text, k)?;
        (0..worker.num_nbest_paths())
            .map(|i| {
                worker
                    .nbest_token_iter(i)
                    .into_iter()
                    .flatten()
                    .map(|t| t.to_morpheme(self.schema))
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }

    /// Tokenizes `text` and renders it in the configured [`OutputFormat`].
    pub fn parse(&self, text: &str) -> Result<String> {
        let mut worker = self.tokenizer.new_worker();
        worker.reset_sentence(text);
        worker.tokenize()?;
        let mut out = String::new();
        output::write_sentence(&mut out, self.output_format, worker.token_iter())
            .map_err(|e| TsumugiError::invalid_state("formatting failed", e.to_string()))?;
        Ok(out)
    }

    /// Renders up to `k` best sequences of `text` as consecutive mecab blocks.
    pub fn parse_nbest(&self, text: &str, k: usize) -> Result<String> {
        let worker = self.nbest_worker(text, k)?;
        let mut out = String::new();
        for tokens in (0..worker.num_nbest_paths()).filter_map(|i| worker.nbest_token_iter(i)) {
            output::write_sentence(&mut out, OutputFormat::Mecab, tokens)
                .map_err(|e| TsumugiError::invalid_state("formatting failed", e.to_string()))?;
        }
        Ok(out)
    }

    /// Renders raw bytes, which must be UTF-8, as [`Self::parse`] does.
    ///
    /// # Errors
    ///
    /// [`TsumugiError::InvalidInput`] carries the byte offset of the first
    /// invalid sequence.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<String> {
        self.parse(decode_utf8(bytes)?)
    }

    /// Renders raw bytes, which must be UTF-8, as [`Self::parse_nbest`] does.
    pub fn parse_nbest_bytes(&self, bytes: &[u8], k: usize) -> Result<String> {
        self.parse_nbest(decode_utf8(bytes)?, k)
    }

    /// Lists the system dictionary and the user dictionaries, in load order.
    pub fn list_dictionaries(&self) -> Vec<DictionaryInfo> {
        self.tokenizer.dictionary().infos()
    }

    fn nbest_worker(&self, text: &str, k: usize) -> Result<Worker> {
        let mut worker = self.tokenizer.new_worker();
        worker.reset_sentence(text);
        worker.tokenize_nbest(k)?;
        Ok(worker)
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| {
        TsumugiError::InvalidInput(InvalidInputError {
            offset: e.valid_up_to(),
        })
    })
}

fn invalid_rcfile(path: &Path, e: &TsumugiError) -> TsumugiError {
    InitializationError::new(format!("cannot use resource file {}", path.display()))
        .checked(e.to_string())
        .hint("fix the file, or point -r/$TSUMUGIRC at another one")
        .into()
}

// -r, then $TSUMUGIRC, then ~/.tsumugirc. Only the last may be absent.
fn find_rcfile(config: &TaggerConfig) -> Result<Option<RcFile>> {
    let explicit = config
        .rcfile
        .clone()
        .or_else(|| env::var_os(RCFILE_ENV).map(PathBuf::from));
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(InitializationError::new("resource file not found")
                .checked(format!("{} (from -r or ${RCFILE_ENV})", path.display()))
                .hint("create the file or drop the option")
                .into());
        }
        return RcFile::from_path(&path)
            .map(Some)
            .map_err(|e| invalid_rcfile(&path, &e));
    }
    let Some(path) = dirs::home_dir().map(|home| home.join(HOME_RCFILE)) else {
        return Ok(None);
    };
    if !path.is_file() {
        return Ok(None);
    }
    RcFile::from_path(&path)
        .map(Some)
        .map_err(|e| invalid_rcfile(&path, &e))
}

fn load_system_dictionary(config: &TaggerConfig) -> Result<Dictionary> {
    if let Some(sysdic) = &config.sysdic {
        if !sysdic.is_file() {
            return Err(InitializationError::new("system dictionary not found")
                .checked(format!("{} (from -s/sysdic)", sysdic.display()))
                .hint("pass the path of a compiled sys.dic or sys.dic.zst")
                .into());
        }
        return if sysdic.extension().is_some_and(|ext| ext == "zst") {
            Dictionary::from_zstd(sysdic)
        } else {
            Dictionary::from_path(sysdic, config.load_mode)
        };
    }

    let Some(dicdir) = &config.dicdir else {
        return Err(InitializationError::new("no system dictionary configured")
            .checked("-d/--dicdir and -s/--sysdic (unset)")
            .checked(format!("${RCFILE_ENV} and ~/{HOME_RCFILE} (no dicdir key)"))
            .checked(format!("${DICDIR_ENV} (unset)"))
            .hint("pass -d <dir> holding sys.dic, sys.dic.zst or MeCab sources (matrix.def, char.def, unk.def, *.csv)")
            .hint(format!("or set ${DICDIR_ENV}, or add `dicdir = <dir>` to ~/{HOME_RCFILE}"))
            .into());
    };
    if !dicdir.is_dir() {
        return Err(InitializationError::new("dictionary directory not found")
            .checked(dicdir.display().to_string())
            .hint("install a dictionary there, or point -d/dicdir/$TSUMUGI_DICDIR elsewhere")
            .into());
    }
    Dictionary::from_dir(dicdir, config.load_mode)
}

fn detect_schema(tokenizer: &Tokenizer) -> Result<FeatureSchema> {
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence(PROBE_TEXT);
    worker.tokenize()?;
    let token = worker
        .token_iter()
        .find(|t| t.status() == NodeStatus::Normal)
        .or_else(|| worker.token_iter().next())
        .ok_or_else(|| TsumugiError::invalid_state("schema detection", "no probe tokens"))?;
    let schema = FeatureSchema::detect(token.feature())?;
    log::debug!(
        "[tsumugi] Detected feature schema {schema} from {:?}",
        token.surface()
    );
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_utf8("自然".as_bytes()).unwrap(), "自然");
        let mut bytes = "自然".as_bytes().to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice("言語".as_bytes());
        match decode_utf8(&bytes) {
            Err(TsumugiError::InvalidInput(e)) => assert_eq!(e.offset(), 6),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_rcfile() {
        let err = Tagger::new(TaggerConfig::new().rcfile("/nonexistent/tsumugirc"))
            .err()
            .unwrap();
        assert!(err.is_initialization());
        assert!(err.to_string().contains("/nonexistent/tsumugirc"));
    }

    #[test]
    fn test_missing_dicdir() {
        let err = Tagger::new(TaggerConfig::new().dicdir("/nonexistent/dic"))
            .err()
            .unwrap();
        assert!(matches!(err, TsumugiError::Initialization(_)));
        assert!(err.to_string().contains("/nonexistent/dic"));
    }

    #[test]
    fn test_missing_sysdic() {
        let err = Tagger::new(TaggerConfig::new().sysdic("/nonexistent/sys.dic"))
            .err()
            .unwrap();
        assert!(err.is_initialization());
    }
}
