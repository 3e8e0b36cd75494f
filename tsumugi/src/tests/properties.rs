use crate::dictionary::{Dictionary, SystemDictionaryBuilder};
use crate::errors::TsumugiError;
use crate::feature::split_feature;
use crate::tagger::Tagger;
use crate::tests::{build_tokenizer, build_tokenizer_with_user};
use crate::token::NodeStatus;
use crate::tokenizer::Tokenizer;

const TEXTS: &[&str] = &[
    "東京都に住んでいる。",
    "京都 東京都　2024年 ",
    "  カタカナとABCと１２３",
    "🍣を食べる",
    "東京都庁",
    "a",
    " ",
];

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_thread_safety() {
    assert_send_sync::<Dictionary>();
    assert_send_sync::<Tokenizer>();
    assert_send_sync::<Tagger>();
}

#[test]
fn test_tokens_reconstruct_input() {
    let plain = build_tokenizer_with_user();
    let ignoring = plain.clone().ignore_space(true).unwrap();
    for tokenizer in [&plain, &ignoring] {
        let mut worker = tokenizer.new_worker();
        for &text in TEXTS {
            worker.reset_sentence(text);
            worker.tokenize().unwrap();

            let mut rebuilt = String::new();
            let mut end_byte = 0;
            let mut end_char = 0;
            for t in worker.token_iter() {
                assert_eq!(t.range_byte().start, end_byte + t.white_space().len());
                assert_eq!(
                    t.range_char().start,
                    end_char + t.white_space().chars().count()
                );
                assert_eq!(t.rlength(), t.length() + t.white_space().len());
                rebuilt.push_str(t.white_space());
                rebuilt.push_str(t.surface());
                end_byte = t.range_byte().end;
                end_char = t.range_char().end;
            }
            assert_eq!(rebuilt, text);
            assert_eq!(end_char, text.chars().count());
        }
    }
}

#[test]
fn test_plain_tokens_have_no_white_space() {
    let tokenizer = build_tokenizer();
    let mut worker = tokenizer.new_worker();
    for &text in TEXTS {
        worker.reset_sentence(text);
        worker.tokenize().unwrap();
        assert!(worker.token_iter().all(|t| t.white_space().is_empty()));
    }
}

#[test]
fn test_deterministic() {
    let tokenizer = build_tokenizer_with_user();
    let run = |text: &str| {
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence(text);
        worker.tokenize().unwrap();
        worker
            .token_iter()
            .map(|t| (t.range_char(), t.word_idx(), t.total_cost()))
            .collect::<Vec<_>>()
    };
    for &text in TEXTS {
        assert_eq!(run(text), run(text));
    }
}

#[test]
fn test_concurrent_workers() {
    let tokenizer = build_tokenizer_with_user();
    let expected: Vec<Vec<String>> = TEXTS
        .iter()
        .map(|text| crate::tests::surfaces(&tokenizer, text))
        .collect();

    std::thread::scope(|s| {
        for _ in 0..4 {
            let tokenizer = tokenizer.clone();
            let expected = &expected;
            s.spawn(move || {
                for (text, want) in TEXTS.iter().zip(expected) {
                    assert_eq!(&crate::tests::surfaces(&tokenizer, text), want);
                }
            });
        }
    });
}

#[test]
fn test_unknown_words_cover_every_category() {
    // Every character falls back to DEFAULT at worst, so any input has a path.
    let tokenizer = build_tokenizer();
    let mut worker = tokenizer.new_worker();
    for text in ["ヴ", "Ω", "\u{1F600}\u{1F600}", "ａｂｃ", "\t"] {
        worker.reset_sentence(text);
        worker.tokenize().unwrap();
        assert!(worker.num_tokens() >= 1, "{text:?}");
        assert!(
            worker.token_iter().all(|t| t.status() == NodeStatus::Unknown),
            "{text:?}"
        );
    }
}

#[test]
fn test_uncoverable_category_fails_to_load() {
    // KANJI characters outside the lexicon would have no candidate at all.
    let result = SystemDictionaryBuilder::from_readers(
        "東京,0,0,10,名詞".as_bytes(),
        "1 1\n0 0 0".as_bytes(),
        "DEFAULT 0 1 0\nKANJI 0 0 2\n0x4E00..0x9FFF KANJI".as_bytes(),
        "DEFAULT,0,0,100,*".as_bytes(),
    );
    match result {
        Err(e @ TsumugiError::InvalidFormat(_)) => {
            assert!(e.to_string().contains("cannot find UNK category: KANJI"))
        }
        Err(e) => panic!("unexpected: {e}"),
        Ok(_) => panic!("dictionary loaded"),
    }
}

#[test]
fn test_feature_split_agrees_with_naive_split() {
    let tokenizer = build_tokenizer();
    let mut worker = tokenizer.new_worker();
    worker.reset_sentence("東京都に住んでいる。カタカナ");
    worker.tokenize().unwrap();
    for t in worker.token_iter() {
        let naive: Vec<_> = t.feature().split(',').collect();
        assert_eq!(split_feature(t.feature()).unwrap(), naive);
    }
}
