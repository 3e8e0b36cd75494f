//! Decoding of feature strings.
//!
//! A feature string is a comma-separated list of fields. A field may be
//! quoted to hold commas, with `""` standing for a literal quote:
//!
//! ```text
//! line   := field (',' field)*
//! field  := quoted | bare
//! bare   := [^,"]*
//! quoted := '"' ( [^"] | '""' )* '"'
//! ```
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, SchemaMismatchError, TsumugiError};

/// Splits a feature string into its fields, unquoting quoted ones.
///
/// # Errors
///
/// [`TsumugiError::InvalidFormat`] is returned for a quote inside a bare field,
/// an unterminated quoted field, or text between a closing quote and the next
/// comma.
///
/// # Examples
///
/// ```
/// use tsumugi::feature::split_feature;
///
/// let fields = split_feature(r#"名詞,"1,2",*"#).unwrap();
/// assert_eq!(fields, vec!["名詞", "1,2", "*"]);
/// ```
pub fn split_feature(feature: &str) -> Result<Vec<Cow<'_, str>>> {
    let bytes = feature.as_bytes();
    let mut fields = vec![];
    let mut pos = 0;
    loop {
        let (field, next) = if bytes.get(pos) == Some(&b'"') {
            parse_quoted(feature, pos)?
        } else {
            parse_bare(feature, pos)?
        };
        fields.push(field);
        match bytes.get(next) {
            None => return Ok(fields),
            Some(b',') => pos = next + 1,
            Some(_) => {
                return Err(TsumugiError::invalid_format(
                    "feature",
                    format!("unexpected character after a quoted field at byte {next}: {feature:?}"),
                ));
            }
        }
    }
}

// Returns the field and the position of the byte following it.
fn parse_bare(feature: &str, start: usize) -> Result<(Cow<'_, str>, usize)> {
    let end = feature[start..]
        .find([',', '"'])
        .map_or(feature.len(), |i| start + i);
    if feature.as_bytes().get(end) == Some(&b'"') {
        return Err(TsumugiError::invalid_format(
            "feature",
            format!("stray quote at byte {end}: {feature:?}"),
        ));
    }
    Ok((Cow::Borrowed(&feature[start..end]), end))
}

fn parse_quoted(feature: &str, start: usize) -> Result<(Cow<'_, str>, usize)> {
    let bytes = feature.as_bytes();
    let body = start + 1;
    let mut i = body;
    let mut escaped = false;
    loop {
        match bytes.get(i) {
            None => {
                return Err(TsumugiError::invalid_format(
                    "feature",
                    format!("unterminated quoted field at byte {start}: {feature:?}"),
                ));
            }
            Some(b'"') if bytes.get(i + 1) == Some(&b'"') => {
                escaped = true;
                i += 2;
            }
            Some(b'"') => break,
            Some(_) => i += 1,
        }
    }
    let raw = &feature[body..i];
    let field = if escaped {
        Cow::Owned(raw.replace("\"\"", "\""))
    } else {
        Cow::Borrowed(raw)
    };
    Ok((field, i + 1))
}

macro_rules! feature_record {
    (
        $(#[$meta:meta])*
        $name:ident { $($field:ident => $key:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            $(
                #[doc = concat!("`", $key, "`")]
                pub $field: Option<String>,
            )*
        }

        impl $name {
            /// Field names in dictionary order.
            pub const FIELD_NAMES: &'static [&'static str] = &[$($key),*];

            /// Number of fields.
            pub const ARITY: usize = Self::FIELD_NAMES.len();

            // Missing trailing fields stay `None`.
            fn from_fields(fields: Vec<Cow<'_, str>>) -> Self {
                let mut it = fields.into_iter().map(Cow::into_owned);
                Self {
                    $($field: it.next(),)*
                }
            }

            /// Gets a field by its dictionary name, e.g. `"pos1"` or `"cType"`.
            pub fn get(&self, key: &str) -> Option<&str> {
                match key {
                    $($key => self.$field.as_deref(),)*
                    _ => None,
                }
            }
        }
    };
}

feature_record! {
    /// UniDic record with 17 fields.
    Unidic17 {
        pos1 => "pos1",
        pos2 => "pos2",
        pos3 => "pos3",
        pos4 => "pos4",
        c_type => "cType",
        c_form => "cForm",
        l_form => "lForm",
        lemma => "lemma",
        orth => "orth",
        pron => "pron",
        orth_base => "orthBase",
        pron_base => "pronBase",
        goshu => "goshu",
        i_type => "iType",
        i_form => "iForm",
        f_type => "fType",
        f_form => "fForm",
    }
}

feature_record! {
    /// UniDic record with 26 fields.
    Unidic26 {
        pos1 => "pos1",
        pos2 => "pos2",
        pos3 => "pos3",
        pos4 => "pos4",
        c_type => "cType",
        c_form => "cForm",
        l_form => "lForm",
        lemma => "lemma",
        orth => "orth",
        pron => "pron",
        orth_base => "orthBase",
        pron_base => "pronBase",
        goshu => "goshu",
        i_type => "iType",
        i_form => "iForm",
        f_type => "fType",
        f_form => "fForm",
        kana => "kana",
        kana_base => "kanaBase",
        form => "form",
        form_base => "formBase",
        i_con_type => "iConType",
        f_con_type => "fConType",
        a_type => "aType",
        a_con_type => "aConType",
        a_mod_type => "aModType",
    }
}

feature_record! {
    /// UniDic record with 29 fields.
    Unidic29 {
        pos1 => "pos1",
        pos2 => "pos2",
        pos3 => "pos3",
        pos4 => "pos4",
        c_type => "cType",
        c_form => "cForm",
        l_form => "lForm",
        lemma => "lemma",
        orth => "orth",
        pron => "pron",
        orth_base => "orthBase",
        pron_base => "pronBase",
        goshu => "goshu",
        i_type => "iType",
        i_form => "iForm",
        f_type => "fType",
        f_form => "fForm",
        i_con_type => "iConType",
        f_con_type => "fConType",
        word_type => "type",
        kana => "kana",
        kana_base => "kanaBase",
        form => "form",
        form_base => "formBase",
        a_type => "aType",
        a_con_type => "aConType",
        a_mod_type => "aModType",
        lid => "lid",
        lemma_id => "lemma_id",
    }
}

/// Layout of the feature strings of a dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureSchema {
    /// UniDic with 17 fields.
    Unidic17,
    /// UniDic with 26 fields.
    Unidic26,
    /// UniDic with 29 fields.
    Unidic29,
    /// Any number of unnamed fields. Never auto-detected.
    #[default]
    Raw,
}

impl FeatureSchema {
    /// Schemas tried by [`Self::detect`].
    pub const DETECTABLE: [Self; 3] = [Self::Unidic17, Self::Unidic26, Self::Unidic29];

    /// Number of fields, or `None` for [`Self::Raw`].
    pub const fn arity(self) -> Option<usize> {
        match self {
            Self::Unidic17 => Some(Unidic17::ARITY),
            Self::Unidic26 => Some(Unidic26::ARITY),
            Self::Unidic29 => Some(Unidic29::ARITY),
            Self::Raw => None,
        }
    }

    /// Name accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unidic17 => "unidic17",
            Self::Unidic26 => "unidic26",
            Self::Unidic29 => "unidic29",
            Self::Raw => "raw",
        }
    }

    /// Selects the schema whose arity equals the field count of `feature`.
    ///
    /// # Errors
    ///
    /// [`TsumugiError::SchemaMismatch`] is returned when no schema has that
    /// arity, and [`TsumugiError::InvalidFormat`] when `feature` is malformed.
    pub fn detect(feature: &str) -> Result<Self> {
        let found = split_feature(feature)?.len();
        Self::DETECTABLE
            .into_iter()
            .find(|s| s.arity() == Some(found))
            .ok_or_else(|| {
                TsumugiError::SchemaMismatch(SchemaMismatchError {
                    found,
                    expected: Self::DETECTABLE.iter().filter_map(|s| s.arity()).collect(),
                    feature: feature.to_string(),
                })
            })
    }

    /// Decodes `feature` into a record of this schema.
    ///
    /// Fields missing at the end are left as `None`.
    ///
    /// # Errors
    ///
    /// [`TsumugiError::SchemaMismatch`] is returned when `feature` has more
    /// fields than the arity, and [`TsumugiError::InvalidFormat`] when it is
    /// malformed.
    pub fn decode(self, feature: &str) -> Result<Features> {
        let fields = split_feature(feature)?;
        if let Some(arity) = self.arity() {
            if fields.len() > arity {
                return Err(TsumugiError::SchemaMismatch(SchemaMismatchError {
                    found: fields.len(),
                    expected: vec![arity],
                    feature: feature.to_string(),
                }));
            }
        }
        Ok(match self {
            Self::Unidic17 => Features::Unidic17(Unidic17::from_fields(fields)),
            Self::Unidic26 => Features::Unidic26(Unidic26::from_fields(fields)),
            Self::Unidic29 => Features::Unidic29(Unidic29::from_fields(fields)),
            Self::Raw => Features::Raw(fields.into_iter().map(Cow::into_owned).collect()),
        })
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureSchema {
    type Err = TsumugiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "unidic17" | "17" => Ok(Self::Unidic17),
            "unidic26" | "26" => Ok(Self::Unidic26),
            "unidic29" | "29" => Ok(Self::Unidic29),
            "raw" => Ok(Self::Raw),
            _ => Err(TsumugiError::invalid_argument(
                "schema",
                format!("unknown schema {s:?}; expected unidic17, unidic26, unidic29 or raw"),
            )),
        }
    }
}

/// A decoded feature string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Features {
    /// See [`Unidic17`].
    Unidic17(Unidic17),
    /// See [`Unidic26`].
    Unidic26(Unidic26),
    /// See [`Unidic29`].
    Unidic29(Unidic29),
    /// Unnamed fields.
    Raw(Vec<String>),
}

impl Features {
    /// Schema of the record.
    pub const fn schema(&self) -> FeatureSchema {
        match self {
            Self::Unidic17(_) => FeatureSchema::Unidic17,
            Self::Unidic26(_) => FeatureSchema::Unidic26,
            Self::Unidic29(_) => FeatureSchema::Unidic29,
            Self::Raw(_) => FeatureSchema::Raw,
        }
    }

    /// Gets a field by its UniDic name. Always `None` for raw records.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            Self::Unidic17(r) => r.get(key),
            Self::Unidic26(r) => r.get(key),
            Self::Unidic29(r) => r.get(key),
            Self::Raw(_) => None,
        }
    }

    /// Top-level part of speech: `pos1`, or the first raw field.
    pub fn pos(&self) -> Option<&str> {
        match self {
            Self::Raw(v) => v.first().map(String::as_str),
            _ => self.get("pos1"),
        }
    }
}
