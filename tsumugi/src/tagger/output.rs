use std::fmt::{self, Write};

use crate::tagger::config::OutputFormat;
use crate::token::TokenIter;

/// Appends one sentence in `format` to `out`.
pub(crate) fn write_sentence(
    out: &mut String,
    format: OutputFormat,
    tokens: TokenIter<'_>,
) -> fmt::Result {
    match format {
        OutputFormat::Mecab => {
            for t in tokens {
                writeln!(out, "{}\t{}", t.surface(), t.feature())?;
            }
            out.push_str("EOS\n");
        }
        OutputFormat::Wakati => {
            for (i, t) in tokens.enumerate() {
                if i != 0 {
                    out.push(' ');
                }
                out.push_str(t.surface());
            }
            out.push('\n');
        }
        OutputFormat::Detail => {
            for t in tokens {
                writeln!(
                    out,
                    "{}\t{}\tlex_type={:?}\tleft_id={}\tright_id={}\tword_cost={}\ttotal_cost={}",
                    t.surface(),
                    t.feature(),
                    t.lex_type(),
                    t.left_id(),
                    t.right_id(),
                    t.word_cost(),
                    t.total_cost(),
                )?;
            }
            out.push_str("EOS\n");
        }
    }
    Ok(())
}
