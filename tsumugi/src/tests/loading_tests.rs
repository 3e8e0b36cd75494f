//! Loading compiled dictionaries from files, compressed files and directories.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

use tsumugi::dictionary::{MODEL_MAGIC, SYSDIC_FILE, SYSDIC_ZSTD_FILE};
use tsumugi::errors::TsumugiError;
use tsumugi::{Dictionary, LoadMode, SystemDictionaryBuilder, Tagger, Tokenizer};

const LEX_CSV: &str = include_str!("./resources/lex.csv");
const USER_CSV: &str = include_str!("./resources/user.csv");
const MATRIX_DEF: &str = include_str!("./resources/matrix.def");
const CHAR_DEF: &str = include_str!("./resources/char.def");
const UNK_DEF: &str = include_str!("./resources/unk.def");

pub struct TestEnv {
    _temp_dir: TempDir,
    pub work_dir: PathBuf,
    pub dic_path: PathBuf,
    pub zst_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("Failed to create a temporary directory");
        let work_dir = temp_dir.path().to_path_buf();

        let dict_inner = SystemDictionaryBuilder::from_readers(
            LEX_CSV.as_bytes(),
            MATRIX_DEF.as_bytes(),
            CHAR_DEF.as_bytes(),
            UNK_DEF.as_bytes(),
        )
        .unwrap();
        let dic_path = work_dir.join(SYSDIC_FILE);
        dict_inner.write(fs::File::create(&dic_path).unwrap()).unwrap();

        let zst_path = work_dir.join(SYSDIC_ZSTD_FILE);
        let compressed = zstd::encode_all(fs::File::open(&dic_path).unwrap(), 3).unwrap();
        fs::write(&zst_path, compressed).unwrap();

        Self {
            _temp_dir: temp_dir,
            work_dir,
            dic_path,
            zst_path,
        }
    }

    fn subdir(&self, name: &str) -> PathBuf {
        let dir = self.work_dir.join(name);
        fs::create_dir(&dir).unwrap();
        dir
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        TestEnv::new()
    }
}

fn sidecar(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".sha256");
    PathBuf::from(s)
}

fn surfaces(dict: Dictionary, text: &str) -> Vec<String> {
    let tokenizer = Tokenizer::new(dict);
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence(text);
    worker.tokenize().unwrap();
    worker.token_iter().map(|t| t.surface().to_string()).collect()
}

#[test]
fn test_from_path_validate_mode() {
    let env = TestEnv::new();
    let dict = Dictionary::from_path(&env.dic_path, LoadMode::Validate).unwrap();
    assert!(!sidecar(&env.dic_path).exists());
    assert_eq!(dict.num_connection_ids(), (4, 4));
    assert_eq!(
        surfaces(dict, "東京都に住んでいる。"),
        vec!["東京都", "に", "住ん", "で", "いる", "。"]
    );
}

#[test]
fn test_from_path_trustcache_flow() {
    let env = TestEnv::new();
    let hash_path = sidecar(&env.dic_path);

    let _ = Dictionary::from_path(&env.dic_path, LoadMode::TrustCache).unwrap();
    assert!(hash_path.exists());
    let hash = fs::read_to_string(&hash_path).unwrap();
    assert_eq!(hash.trim().len(), 64);

    {
        let dict_hit = Dictionary::from_path(&env.dic_path, LoadMode::TrustCache).unwrap();
        assert_eq!(surfaces(dict_hit, "京都"), vec!["京都"]);
    }

    // Rewriting the file changes its metadata, so the cache no longer applies.
    fs::write(&env.dic_path, b"corrupted data").unwrap();
    let result_corrupted = Dictionary::from_path(&env.dic_path, LoadMode::TrustCache);
    assert!(matches!(result_corrupted, Err(TsumugiError::DictionaryLoad(_))));
}

#[test]
fn test_from_zstd() {
    let env = TestEnv::new();
    let dict = Dictionary::from_zstd(&env.zst_path).unwrap();
    assert_eq!(dict.infos()[0].path.as_deref(), Some(env.zst_path.as_path()));
    assert_eq!(surfaces(dict, "京都東京都"), vec!["京都", "東京都"]);
}

#[test]
fn test_from_zstd_not_compressed() {
    let env = TestEnv::new();
    assert!(Dictionary::from_zstd(&env.dic_path).is_err());
}

#[test]
fn test_from_dir() {
    let env = TestEnv::new();

    // sys.dic comes first.
    let dict = Dictionary::from_dir(&env.work_dir, LoadMode::Validate).unwrap();
    assert_eq!(dict.infos()[0].path.as_deref(), Some(env.dic_path.as_path()));

    let zst_only = env.subdir("zst");
    let zst_path = zst_only.join(SYSDIC_ZSTD_FILE);
    fs::copy(&env.zst_path, &zst_path).unwrap();
    let dict = Dictionary::from_dir(&zst_only, LoadMode::Validate).unwrap();
    assert_eq!(dict.infos()[0].path.as_deref(), Some(zst_path.as_path()));

    let sources = env.subdir("sources");
    fs::write(sources.join("lex.csv"), LEX_CSV).unwrap();
    fs::write(sources.join("matrix.def"), MATRIX_DEF).unwrap();
    fs::write(sources.join("char.def"), CHAR_DEF).unwrap();
    fs::write(sources.join("unk.def"), UNK_DEF).unwrap();
    let dict = Dictionary::from_dir(&sources, LoadMode::Validate).unwrap();
    assert_eq!(dict.infos()[0].entry_count, LEX_CSV.lines().count());
    assert_eq!(surfaces(dict, "東京都"), vec!["東京都"]);
}

#[test]
fn test_from_dir_missing() {
    let env = TestEnv::new();
    let empty = env.subdir("empty");
    match Dictionary::from_dir(&empty, LoadMode::Validate) {
        Err(TsumugiError::DictionaryLoad(e)) => assert_eq!(e.path(), empty.as_path()),
        other => panic!("unexpected: {:?}", other.err()),
    }
    assert!(Dictionary::from_dir(env.work_dir.join("nowhere"), LoadMode::Validate).is_err());
}

#[test]
fn test_bad_magic() {
    let env = TestEnv::new();
    let path = env.work_dir.join("bad.dic");
    fs::write(&path, b"NotADictionary\n0123456789abcdef0123456789").unwrap();
    let err = Dictionary::from_path(&path, LoadMode::Validate).err().unwrap();
    assert!(err.to_string().contains("magic"));
}

#[test]
fn test_incompatible_version() {
    let env = TestEnv::new();
    let mut bytes = fs::read(&env.dic_path).unwrap();
    assert!(bytes.starts_with(MODEL_MAGIC));
    let version_at = MODEL_MAGIC.len() - 2;
    bytes[version_at] = b'9';
    let path = env.work_dir.join("future.dic");
    fs::write(&path, bytes).unwrap();

    let err = Dictionary::from_path(&path, LoadMode::Validate).err().unwrap();
    assert!(err.is_initialization());
    assert!(err.to_string().contains("incompatible format version"));
}

#[test]
fn test_user_lexicon_from_path() {
    let env = TestEnv::new();
    let user_path = env.work_dir.join("user.csv");
    fs::write(&user_path, USER_CSV).unwrap();

    let mut dict = Dictionary::from_path(&env.dic_path, LoadMode::Validate).unwrap();
    dict.add_user_lexicon_from_path(&user_path).unwrap();
    let infos = dict.infos();
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[1].path.as_deref(), Some(user_path.as_path()));
    assert_eq!(surfaces(dict, "東京都庁"), vec!["東京都庁"]);

    let bad_path = env.work_dir.join("bad.csv");
    fs::write(&bad_path, "東京,9,9,100,名詞").unwrap();
    let mut dict = Dictionary::from_path(&env.dic_path, LoadMode::Validate).unwrap();
    assert!(dict.add_user_lexicon_from_path(&bad_path).is_err());
    assert!(dict.add_user_lexicon_from_path(env.work_dir.join("none.csv")).is_err());
}

#[test]
fn test_tagger_sysdic_zstd() {
    let env = TestEnv::new();
    let rcfile = env.work_dir.join("tsumugirc");
    fs::write(&rcfile, "").unwrap();
    let tagger = Tagger::from_args(&format!(
        "-r {} -s {} -O wakati",
        rcfile.display(),
        env.zst_path.display()
    ))
    .unwrap();
    assert_eq!(tagger.parse("東京都に住んでいる。").unwrap(), "東京都 に 住ん で いる 。\n");
}
