//! CLI front-end: mines multi-word terms out of one or more text files (or
//! stdin) and prints `surface\tscore` lines ordered by descending score.

use clap::Parser;
use qubiq_terms::cli::ExtractTermsArgs;
use qubiq_terms::{EnglishTermFilter, Extractor, Locale, Text};

fn main() {
    let args = ExtractTermsArgs::parse();
    qubiq_terms::tracing::init(&args.log_level);

    if let Err(message) = run(&args) {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn run(args: &ExtractTermsArgs) -> Result<(), String> {
    let locale = Locale::from_tag(args.language.as_deref().unwrap_or(""));
    let mut text = Text::new(locale);

    if args.file.is_empty() {
        text.append_stdin(std::io::stdin().lock())
            .map_err(|e| e.to_string())?;
    } else {
        for path in &args.file {
            text.append_file(path).map_err(|e| e.to_string())?;
        }
    }

    let extractor = Extractor::with_config(&text, args.extractor_config());
    let is_english = args
        .language
        .as_deref()
        .is_some_and(|l| l.to_ascii_lowercase().starts_with("en"));
    let filter = is_english.then(EnglishTermFilter::new);

    let terms = extractor
        .extract(filter.as_ref().map(|f| f as &dyn qubiq_terms::TermFilter), true)
        .map_err(|e| e.to_string())?;

    for term in &terms {
        println!("{}\t{}", term.image(text.index()), term.score());
    }

    Ok(())
}
