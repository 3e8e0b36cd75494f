//! Tokenization throughput on the bundled test dictionary.

use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tsumugi::{Dictionary, SystemDictionaryBuilder, Tokenizer};

const LEX_CSV: &str = include_str!("../src/tests/resources/lex.csv");
const MATRIX_DEF: &str = include_str!("../src/tests/resources/matrix.def");
const CHAR_DEF: &str = include_str!("../src/tests/resources/char.def");
const UNK_DEF: &str = include_str!("../src/tests/resources/unk.def");

const LINES: &[&str] = &[
    "東京都に住んでいる。",
    "京都東京都",
    "カタカナと東京都庁舎に住んでいる。",
    "2024年の東京 に いる",
    "ＡＢＣ１２３と漢字仮名交じり文",
];

fn bench_tokenization(c: &mut Criterion) {
    let dict_inner = SystemDictionaryBuilder::from_readers(
        LEX_CSV.as_bytes(),
        MATRIX_DEF.as_bytes(),
        CHAR_DEF.as_bytes(),
        UNK_DEF.as_bytes(),
    )
    .unwrap();
    let dict = Arc::new(Dictionary::from_inner(dict_inner));

    let corpus: Vec<&str> = LINES.iter().copied().cycle().take(1000).collect();
    let total_bytes: usize = corpus.iter().map(|l| l.len()).sum();

    let mut group = c.benchmark_group("Tokenization Speed");
    group.throughput(Throughput::Bytes(total_bytes as u64));
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(5));

    group.bench_function(BenchmarkId::new("Default", "Corpus"), |b| {
        b.iter_with_setup(
            || Tokenizer::from_shared_dictionary(dict.clone()).new_worker(),
            |mut worker| {
                for line in &corpus {
                    worker.reset_sentence(line);
                    worker.tokenize().unwrap();
                }
            },
        );
    });

    group.bench_function(BenchmarkId::new("MeCab-Compat", "Corpus"), |b| {
        b.iter_with_setup(
            || {
                Tokenizer::from_shared_dictionary(dict.clone())
                    .ignore_space(true)
                    .unwrap()
                    .max_grouping_len(24)
                    .new_worker()
            },
            |mut worker| {
                for line in &corpus {
                    worker.reset_sentence(line);
                    worker.tokenize().unwrap();
                }
            },
        );
    });

    for k in [1, 5, 10] {
        group.bench_function(BenchmarkId::new("NBest", k), |b| {
            b.iter_with_setup(
                || Tokenizer::from_shared_dictionary(dict.clone()).new_worker(),
                |mut worker| {
                    for line in &corpus {
                        worker.reset_sentence(line);
                        worker.tokenize_nbest(k).unwrap();
                    }
                },
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tokenization);
criterion_main!(benches);
