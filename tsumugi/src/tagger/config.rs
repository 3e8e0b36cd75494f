//! Tagger configuration and option-string parsing.
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::dictionary::LoadMode;
use crate::errors::{InitializationError, Result};
use crate::feature::FeatureSchema;

/// Serialized text output of [`Tagger::parse`](crate::Tagger::parse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `surface\tfeature` per token, then `EOS`.
    #[default]
    Mecab,
    /// Surfaces separated by a space.
    Wakati,
    /// The mecab line followed by lexicon type, ids and costs, then `EOS`.
    Detail,
}

/// Options accepted by [`TaggerConfig::from_args`] and the `tokenize` command.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tsumugi")]
pub struct TaggerArgs {
    /// Directory of the system dictionary.
    #[arg(short = 'd', long)]
    pub dicdir: Option<PathBuf>,

    /// Compiled system dictionary file. Takes precedence over --dicdir.
    #[arg(short = 's', long)]
    pub sysdic: Option<PathBuf>,

    /// User dictionary in the MeCab CSV format. Repeatable or comma separated.
    #[arg(short = 'u', long, value_delimiter = ',')]
    pub userdic: Vec<PathBuf>,

    /// Resource file.
    #[arg(short = 'r', long)]
    pub rcfile: Option<PathBuf>,

    /// Output format.
    #[arg(short = 'O', long = "output-format-type", value_enum)]
    pub output_format_type: Option<OutputFormat>,

    /// Ignores white spaces in input strings.
    #[arg(short = 'S', long)]
    pub ignore_space: bool,

    /// Maximum length of unknown words. 0 means unbounded.
    #[arg(short = 'M', long = "max-grouping-size")]
    pub max_grouping_size: Option<usize>,

    /// Feature schema: unidic17, unidic26, unidic29 or raw. Detected if unset.
    #[arg(long)]
    pub schema: Option<FeatureSchema>,

    /// Skips archive validation when the .sha256 cache matches.
    #[arg(long)]
    pub trust_cache: bool,
}

/// Configuration of a [`Tagger`](crate::Tagger).
///
/// Unset values are filled from the resource file, then from the `dicrc` in
/// the dictionary directory, then from defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggerConfig {
    pub(crate) dicdir: Option<PathBuf>,
    pub(crate) sysdic: Option<PathBuf>,
    pub(crate) userdics: Vec<PathBuf>,
    pub(crate) rcfile: Option<PathBuf>,
    pub(crate) output_format: Option<OutputFormat>,
    pub(crate) schema: Option<FeatureSchema>,
    pub(crate) ignore_space: Option<bool>,
    pub(crate) max_grouping_len: Option<usize>,
    pub(crate) load_mode: LoadMode,
}

impl TaggerConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a MeCab-style option string such as `"-d /path/to/dic -O wakati"`.
    ///
    /// Arguments are separated by whitespace; paths containing spaces must be
    /// set with the builder methods instead.
    ///
    /// # Errors
    ///
    /// [`TsumugiError::Initialization`](crate::errors::TsumugiError::Initialization)
    /// is returned for unknown or malformed options.
    pub fn from_args(args: &str) -> Result<Self> {
        let argv = std::iter::once("tsumugi").chain(args.split_whitespace());
        let parsed = TaggerArgs::try_parse_from(argv).map_err(|e| {
            InitializationError::new(format!("invalid option string {args:?}"))
                .checked(e.to_string().trim_end().to_string())
                .hint("run `tokenize --help` for the accepted options")
        })?;
        Ok(Self::from(parsed))
    }

    /// Sets the directory of the system dictionary.
    pub fn dicdir<P: Into<PathBuf>>(mut self, dicdir: P) -> Self {
        self.dicdir = Some(dicdir.into());
        self
    }

    /// Sets the compiled system dictionary file.
    pub fn sysdic<P: Into<PathBuf>>(mut self, sysdic: P) -> Self {
        self.sysdic = Some(sysdic.into());
        self
    }

    /// Appends a user dictionary.
    pub fn userdic<P: Into<PathBuf>>(mut self, userdic: P) -> Self {
        self.userdics.push(userdic.into());
        self
    }

    /// Sets the resource file.
    pub fn rcfile<P: Into<PathBuf>>(mut self, rcfile: P) -> Self {
        self.rcfile = Some(rcfile.into());
        self
    }

    /// Sets the output format.
    pub const fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Sets the feature schema, disabling auto-detection.
    pub const fn schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets whether spaces are ignored.
    pub const fn ignore_space(mut self, yes: bool) -> Self {
        self.ignore_space = Some(yes);
        self
    }

    /// Sets the maximum grouping length of unknown words. 0 means unbounded.
    pub const fn max_grouping_len(mut self, len: usize) -> Self {
        self.max_grouping_len = Some(len);
        self
    }

    /// Sets the validation strategy of compiled dictionaries.
    pub const fn load_mode(mut self, mode: LoadMode) -> Self {
        self.load_mode = mode;
        self
    }
}

impl From<TaggerArgs> for TaggerConfig {
    fn from(args: TaggerArgs) -> Self {
        Self {
            dicdir: args.dicdir,
            sysdic: args.sysdic,
            userdics: args.userdic,
            rcfile: args.rcfile,
            output_format: args.output_format_type,
            schema: args.schema,
            ignore_space: args.ignore_space.then_some(true),
            max_grouping_len: args.max_grouping_size,
            load_mode: if args.trust_cache {
                LoadMode::TrustCache
            } else {
                LoadMode::Validate
            },
        }
    }
}
