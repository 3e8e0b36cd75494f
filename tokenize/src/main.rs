use std::error::Error;
use std::io::{BufRead, BufWriter, Write};

use tsumugi::Tagger;
use tsumugi::errors::TsumugiError;
use tsumugi::tagger::config::{TaggerArgs, TaggerConfig};

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "tokenize", about = "Predicts morphemes")]
struct Args {
    #[clap(flatten)]
    tagger: TaggerArgs,

    /// Outputs the N best results in the mecab format.
    #[clap(short = 'N', long)]
    nbest: Option<usize>,

    /// Prints the loaded dictionaries and exits.
    #[clap(short = 'D', long)]
    dictionary_info: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    eprintln!("Loading the dictionary...");
    let tagger = match Tagger::new(TaggerConfig::from(args.tagger)) {
        Ok(tagger) => tagger,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if args.dictionary_info {
        for info in tagger.list_dictionaries() {
            let path = info
                .path
                .as_ref()
                .map_or_else(|| "(memory)".to_string(), |p| p.display().to_string());
            println!("filename:\t{path}");
            println!("version:\t{}", info.version);
            println!("charset:\t{}", info.charset);
            println!("type:\t{:?}", info.lex_type);
            println!("size:\t{}", info.entry_count);
            println!();
        }
        return Ok(());
    }

    eprintln!("Ready to tokenize (schema: {})", tagger.schema());

    let is_tty = atty::is(atty::Stream::Stdout);

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());
    // Lines are split as bytes so that invalid UTF-8 is reported with its offset.
    for (i, line) in std::io::stdin().lock().split(b'\n').enumerate() {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        let result = match args.nbest {
            Some(n) => tagger.parse_nbest_bytes(&line, n),
            None => tagger.parse_bytes(&line),
        };
        let result = match result {
            Ok(result) => result,
            Err(e @ TsumugiError::InvalidInput(_)) => {
                eprintln!("line {}: {e}", i + 1);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        out.write_all(result.as_bytes())?;
        if is_tty {
            out.flush()?;
        }
    }

    Ok(())
}
