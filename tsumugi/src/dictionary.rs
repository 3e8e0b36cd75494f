//! Dictionary for tokenization.
pub mod builder;
pub(crate) mod character;
pub(crate) mod connector;
pub(crate) mod lexicon;
pub(crate) mod unknown;
pub(crate) mod word_idx;

use std::ffi::OsString;
use std::fs::{self, File, Metadata};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{
    Archive, Deserialize, Serialize, access, access_unchecked, api::serialize_using,
    ser::Serializer, ser::allocator::Arena, ser::sharing::Share, ser::writer::IoWriter,
    util::with_arena,
};
use sha2::{Digest, Sha256};

use crate::common::DICTIONARY_CHARSET;
use crate::dictionary::character::CharProperty;
use crate::dictionary::connector::{ConnectorView, MatrixConnector};
use crate::dictionary::lexicon::Lexicon;
use crate::dictionary::unknown::UnkHandler;
use crate::errors::{Result, TsumugiError};

pub use crate::dictionary::builder::SystemDictionaryBuilder;
pub use crate::dictionary::word_idx::WordIdx;

pub(crate) use crate::dictionary::lexicon::WordParam;

/// Version of the binary dictionary format.
pub const FORMAT_VERSION: u32 = 1;

/// Magic bytes identifying a compiled dictionary file.
pub const MODEL_MAGIC: &[u8] = b"TsumugiDictionary 1\n";

const MODEL_MAGIC_PREFIX: &[u8] = b"TsumugiDictionary ";
const MODEL_MAGIC_LEN: usize = MODEL_MAGIC.len();
const RKYV_ALIGNMENT: usize = 16;
const PADDING_LEN: usize = (RKYV_ALIGNMENT - (MODEL_MAGIC_LEN % RKYV_ALIGNMENT)) % RKYV_ALIGNMENT;
const DATA_START: usize = MODEL_MAGIC_LEN + PADDING_LEN;

/// File names probed inside a dictionary directory, in order.
pub const SYSDIC_FILE: &str = "sys.dic";
/// Zstandard-compressed variant of [`SYSDIC_FILE`].
pub const SYSDIC_ZSTD_FILE: &str = "sys.dic.zst";

/// Type of a lexicon that contains the word.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Default, Archive, Serialize, Deserialize)]
#[repr(u8)]
pub enum LexType {
    /// System lexicon.
    #[default]
    System,
    /// User lexicon.
    User,
    /// Unknown words.
    Unknown,
}

/// Validation strategy of [`Dictionary::from_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Perform validation on every load.
    #[default]
    Validate,
    /// Skip validation if the `.sha256` sidecar matches the file metadata.
    TrustCache,
}

/// Inner data of [`Dictionary`].
#[derive(Archive, Serialize, Deserialize)]
pub struct DictionaryInner {
    system_lexicon: Lexicon,
    user_lexicons: Vec<Lexicon>,
    connector: MatrixConnector,
    char_prop: CharProperty,
    unk_handler: UnkHandler,
}

impl DictionaryInner {
    #[inline(always)]
    pub(crate) const fn system_lexicon(&self) -> &Lexicon {
        &self.system_lexicon
    }

    /// User lexicons in load order.
    #[inline(always)]
    pub(crate) fn user_lexicons(&self) -> &[Lexicon] {
        &self.user_lexicons
    }

    #[inline(always)]
    pub(crate) const fn connector(&self) -> &MatrixConnector {
        &self.connector
    }

    #[inline(always)]
    pub(crate) const fn char_prop(&self) -> &CharProperty {
        &self.char_prop
    }

    #[inline(always)]
    pub(crate) const fn unk_handler(&self) -> &UnkHandler {
        &self.unk_handler
    }

    /// Gets the word parameter.
    #[inline(always)]
    pub(crate) fn word_param(&self, word_idx: WordIdx) -> WordParam {
        match word_idx.lex_type {
            LexType::System => self.system_lexicon.word_param(word_idx),
            LexType::User => self.user_lexicons[usize::from(word_idx.lex_id)].word_param(word_idx),
            LexType::Unknown => self.unk_handler.word_param(word_idx),
        }
    }

    /// Gets the feature string.
    #[inline(always)]
    pub fn word_feature(&self, word_idx: WordIdx) -> &str {
        match word_idx.lex_type {
            LexType::System => self.system_lexicon.word_feature(word_idx),
            LexType::User => {
                self.user_lexicons[usize::from(word_idx.lex_id)].word_feature(word_idx)
            }
            LexType::Unknown => self.unk_handler.word_feature(word_idx),
        }
    }

    /// Serializes the dictionary data to a writer using the `rkyv` format.
    ///
    /// The output is what [`Dictionary::read`] and [`Dictionary::from_path`]
    /// expect.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing fails or the `rkyv`
    /// serialization process encounters an error.
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(MODEL_MAGIC)?;

        let padding_bytes = vec![0xFF; PADDING_LEN];
        wtr.write_all(&padding_bytes)?;

        with_arena(|arena: &mut Arena| {
            let writer = IoWriter::new(&mut wtr);
            let mut serializer = Serializer::new(writer, arena.acquire(), Share::new());
            serialize_using::<_, Error>(self, &mut serializer)
        })
        .map_err(|e| TsumugiError::invalid_state("rkyv serialization failed", e.to_string()))?;

        Ok(())
    }

    fn push_user_lexicon(&mut self, mut lexicon: Lexicon) -> Result<()> {
        if !lexicon.verify(&self.connector) {
            return Err(TsumugiError::invalid_argument(
                "user_lexicon_rdr",
                "includes connection ids outside the system matrix.",
            ));
        }
        lexicon.set_lex_id(u16::try_from(self.user_lexicons.len())?);
        self.user_lexicons.push(lexicon);
        Ok(())
    }
}

/// Where a lexicon came from and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryInfo {
    /// File or directory it was loaded from. `None` for in-memory sources.
    pub path: Option<PathBuf>,
    /// Character encoding of surfaces and features.
    pub charset: &'static str,
    /// Number of lexicon entries.
    pub entry_count: usize,
    /// Binary format version.
    pub version: u32,
    /// Whether this is the system or a user lexicon.
    pub lex_type: LexType,
}

/// A read-only dictionary: the system lexicon, user lexicons, connection
/// matrix and unknown-word definitions.
pub struct Dictionary {
    inner: DictionaryInner,
    sys_path: Option<PathBuf>,
    user_paths: Vec<Option<PathBuf>>,
}

impl Dictionary {
    /// Creates a dictionary from `DictionaryInner`.
    pub fn from_inner(inner: DictionaryInner) -> Self {
        let user_paths = vec![None; inner.user_lexicons.len()];
        Self {
            inner,
            sys_path: None,
            user_paths,
        }
    }

    #[inline(always)]
    pub(crate) const fn inner(&self) -> &DictionaryInner {
        &self.inner
    }

    /// Gets the feature string of a word.
    #[inline(always)]
    pub fn word_feature(&self, word_idx: WordIdx) -> &str {
        self.inner.word_feature(word_idx)
    }

    /// Serializes the dictionary, user lexicons included.
    pub fn write<W>(&self, wtr: W) -> Result<()>
    where
        W: Write,
    {
        self.inner.write(wtr)
    }

    /// Creates a dictionary from a reader by loading all data into a heap buffer.
    ///
    /// # Errors
    ///
    /// [`TsumugiError::DictionaryLoad`] is returned when the magic bytes or the
    /// archive are invalid.
    pub fn read<R: Read>(mut rdr: R) -> Result<Self> {
        let mut buffer = Vec::new();
        rdr.read_to_end(&mut buffer)?;
        let inner = decode_archive(&buffer, Path::new("<reader>"), false)?;
        Ok(Self::from_inner(inner))
    }

    /// Creates a dictionary from a compiled file using memory-mapping.
    ///
    /// With [`LoadMode::TrustCache`], validation is skipped when a `.sha256`
    /// file next to the dictionary matches the current file metadata. If the
    /// hash is missing or stale, the archive is validated and the hash file is
    /// (re)written.
    pub fn from_path<P: AsRef<Path>>(path: P, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TsumugiError::dictionary_load(path, format!("failed to open the file: {e}"))
        })?;
        let meta = file.metadata()?;
        // SAFETY: the mapping is read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(&file)? };

        let hash_path = sidecar_path(path);
        let current_hash = compute_metadata_hash(&meta);

        let trusted = mode == LoadMode::TrustCache
            && fs::read_to_string(&hash_path).is_ok_and(|cached| cached.trim() == current_hash);

        let inner = decode_archive(&mmap, path, trusted)?;

        if mode == LoadMode::TrustCache && !trusted {
            if let Err(e) = fs::write(&hash_path, &current_hash) {
                log::warn!(
                    "[tsumugi] Failed to write the hash cache {}: {e}",
                    hash_path.display()
                );
            }
        }

        log::info!(
            "[tsumugi] Loaded {} ({} entries, {:?}{})",
            path.display(),
            inner.system_lexicon.len(),
            mode,
            if trusted { ", cached" } else { "" },
        );

        let mut dict = Self::from_inner(inner);
        dict.sys_path = Some(path.to_path_buf());
        Ok(dict)
    }

    /// Loads a dictionary from a Zstandard-compressed file.
    ///
    /// The file is decompressed into memory and always validated.
    pub fn from_zstd<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TsumugiError::dictionary_load(path, format!("failed to open the file: {e}"))
        })?;
        let mut buffer = Vec::new();
        zstd::Decoder::new(file)
            .and_then(|mut decoder| decoder.read_to_end(&mut buffer))
            .map_err(|e| {
                TsumugiError::dictionary_load(path, format!("zstd decompression failed: {e}"))
            })?;
        let inner = decode_archive(&buffer, path, false)?;

        log::info!(
            "[tsumugi] Loaded {} ({} entries, zstd)",
            path.display(),
            inner.system_lexicon.len(),
        );

        let mut dict = Self::from_inner(inner);
        dict.sys_path = Some(path.to_path_buf());
        Ok(dict)
    }

    /// Loads the system dictionary from a directory.
    ///
    /// Tries `sys.dic`, then `sys.dic.zst`, then compiles MeCab sources
    /// (`matrix.def`, `char.def`, `unk.def`, `*.csv`) in memory.
    pub fn from_dir<P: AsRef<Path>>(dir: P, mode: LoadMode) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(TsumugiError::dictionary_load(dir, "not a directory"));
        }

        let sysdic = dir.join(SYSDIC_FILE);
        if sysdic.is_file() {
            return Self::from_path(sysdic, mode);
        }
        let sysdic_zst = dir.join(SYSDIC_ZSTD_FILE);
        if sysdic_zst.is_file() {
            return Self::from_zstd(sysdic_zst);
        }
        if !dir.join("matrix.def").is_file() {
            return Err(TsumugiError::dictionary_load(
                dir,
                format!("neither {SYSDIC_FILE}, {SYSDIC_ZSTD_FILE} nor matrix.def was found"),
            ));
        }

        let inner = SystemDictionaryBuilder::from_dir(dir)
            .map_err(|e| TsumugiError::dictionary_load(dir, e.to_string()))?;

        log::info!(
            "[tsumugi] Compiled {} from sources ({} entries)",
            dir.display(),
            inner.system_lexicon.len(),
        );

        let mut dict = Self::from_inner(inner);
        dict.sys_path = Some(dir.to_path_buf());
        Ok(dict)
    }

    /// Appends a user lexicon in the MeCab CSV format read from `rdr`.
    ///
    /// # Errors
    ///
    /// [`TsumugiError`] is returned when the CSV is malformed or a connection id
    /// is outside the system matrix.
    pub fn add_user_lexicon_from_reader<R: Read>(&mut self, rdr: R) -> Result<()> {
        let lexicon = Lexicon::from_reader(rdr, LexType::User)?;
        self.inner.push_user_lexicon(lexicon)?;
        self.user_paths.push(None);
        Ok(())
    }

    /// Appends a user lexicon from a CSV file.
    pub fn add_user_lexicon_from_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TsumugiError::dictionary_load(path, format!("failed to open the file: {e}"))
        })?;
        let lexicon = Lexicon::from_reader(file, LexType::User)
            .map_err(|e| TsumugiError::dictionary_load(path, e.to_string()))?;
        let entries = lexicon.len();
        self.inner
            .push_user_lexicon(lexicon)
            .map_err(|e| TsumugiError::dictionary_load(path, e.to_string()))?;
        self.user_paths.push(Some(path.to_path_buf()));

        log::info!(
            "[tsumugi] Loaded user lexicon {} ({entries} entries)",
            path.display()
        );
        Ok(())
    }

    /// Lists the system lexicon and every user lexicon, in load order.
    pub fn infos(&self) -> Vec<DictionaryInfo> {
        let sys = DictionaryInfo {
            path: self.sys_path.clone(),
            charset: DICTIONARY_CHARSET,
            entry_count: self.inner.system_lexicon.len(),
            version: FORMAT_VERSION,
            lex_type: LexType::System,
        };
        let users = self
            .inner
            .user_lexicons
            .iter()
            .zip(&self.user_paths)
            .map(|(lex, path)| DictionaryInfo {
                path: path.clone(),
                charset: DICTIONARY_CHARSET,
                entry_count: lex.len(),
                version: FORMAT_VERSION,
                lex_type: LexType::User,
            });
        std::iter::once(sys).chain(users).collect()
    }

    /// Number of connection ids on each side of the matrix.
    pub fn num_connection_ids(&self) -> (usize, usize) {
        (
            self.inner.connector.num_left(),
            self.inner.connector.num_right(),
        )
    }
}

fn check_magic(bytes: &[u8], path: &Path) -> Result<()> {
    if bytes.starts_with(MODEL_MAGIC) {
        return Ok(());
    }
    if bytes.starts_with(MODEL_MAGIC_PREFIX) {
        let version = bytes[MODEL_MAGIC_PREFIX.len()..]
            .split(|&b| b == b'\n')
            .next()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        return Err(TsumugiError::dictionary_load(
            path,
            format!(
                "incompatible format version {version:?}; this build reads version {FORMAT_VERSION}"
            ),
        ));
    }
    Err(TsumugiError::dictionary_load(
        path,
        "not a compiled dictionary (magic bytes mismatch)",
    ))
}

/// Validates (unless `trusted`) and deserializes an archive following the
/// magic bytes and padding.
fn decode_archive(bytes: &[u8], path: &Path, trusted: bool) -> Result<DictionaryInner> {
    check_magic(bytes, path)?;
    let Some(data_bytes) = bytes.get(DATA_START..) else {
        return Err(TsumugiError::dictionary_load(
            path,
            "file too small or corrupted",
        ));
    };

    let mut aligned: AlignedVec<RKYV_ALIGNMENT>;
    let data_bytes = if (data_bytes.as_ptr() as usize) % RKYV_ALIGNMENT == 0 {
        data_bytes
    } else {
        aligned = AlignedVec::with_capacity(data_bytes.len());
        aligned.extend_from_slice(data_bytes);
        &aligned[..]
    };

    let archived = if trusted {
        // SAFETY: the bytes were validated when the hash sidecar was written,
        // and the metadata hash shows the file has not changed since.
        unsafe { access_unchecked::<ArchivedDictionaryInner>(data_bytes) }
    } else {
        access::<ArchivedDictionaryInner, Error>(data_bytes).map_err(|e| {
            TsumugiError::dictionary_load(path, format!("corrupted or incompatible archive: {e}"))
        })?
    };

    let inner = rkyv::deserialize::<DictionaryInner, Error>(archived)
        .map_err(|e| TsumugiError::dictionary_load(path, format!("deserialization failed: {e}")))?;

    let unk = &inner.unk_handler;
    if unk.num_categories() != inner.char_prop.num_categories() {
        return Err(TsumugiError::dictionary_load(
            path,
            "unknown-word entries do not match the character categories",
        ));
    }
    if let Some(cate_id) = unk.uncovered_category() {
        let name = u32::try_from(cate_id)
            .ok()
            .and_then(|id| inner.char_prop.cate_str(id))
            .unwrap_or_default();
        return Err(TsumugiError::dictionary_load(
            path,
            format!("cannot find UNK category: {name}"),
        ));
    }
    Ok(inner)
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(".sha256");
    PathBuf::from(s)
}

/// Hashes the file identity and modification time, not the content.
#[inline(always)]
pub(crate) fn compute_metadata_hash(meta: &Metadata) -> String {
    let mut hasher = Sha256::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        hasher.update(meta.dev().to_le_bytes());
        hasher.update(meta.ino().to_le_bytes());
        hasher.update(meta.size().to_le_bytes());
        hasher.update(meta.mtime().to_le_bytes());
        hasher.update(meta.mtime_nsec().to_le_bytes());
    }

    #[cfg(not(unix))]
    {
        use std::time::SystemTime;

        hasher.update(meta.len().to_le_bytes());
        match meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        {
            Some(d) => {
                hasher.update(d.as_secs().to_le_bytes());
                hasher.update(d.subsec_nanos().to_le_bytes());
            }
            None => hasher.update([0u8; 12]),
        }
    }

    hex::encode(hasher.finalize())
}
