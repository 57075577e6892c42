//! `clap`-derived argument definitions shared by both command-line tools.

use std::path::PathBuf;

use clap::Parser;

use crate::extractor::ExtractorConfig;

/// `extract-terms` — mine multi-word terms out of a corpus.
#[derive(Parser, Debug)]
#[command(name = "extract-terms")]
#[command(about = "Extract statistically significant multi-word terms from text")]
pub struct ExtractTermsArgs {
    /// Log verbosity passed to the tracing filter (e.g. "info", "debug").
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// 2-letter ISO language code controlling locale-dependent lower-casing.
    #[arg(short = 'l', long)]
    pub language: Option<String>,

    /// Input file(s) to read; stdin is used if none are given.
    #[arg(long = "file")]
    pub file: Vec<PathBuf>,

    /// Minimum bigram frequency to seed expansion.
    #[arg(long)]
    pub mbf: Option<usize>,

    /// Minimum bigram score to seed expansion.
    #[arg(long)]
    pub mbs: Option<f64>,

    /// Maximum source-extraction rate tolerated during expansion.
    #[arg(long)]
    pub mser: Option<f64>,

    /// Maximum left expansion distance.
    #[arg(long)]
    pub mled: Option<u32>,

    /// Maximum right expansion distance.
    #[arg(long)]
    pub mred: Option<u32>,

    /// Quality-decrease threshold tolerated per expansion step.
    #[arg(long)]
    pub qdt: Option<f64>,
}

impl ExtractTermsArgs {
    /// Builds an `ExtractorConfig`, overriding defaults with any flags the
    /// caller actually passed.
    pub fn extractor_config(&self) -> ExtractorConfig {
        let mut config = ExtractorConfig::default();
        if let Some(v) = self.mbf {
            config.min_bigram_frequency = v;
        }
        if let Some(v) = self.mbs {
            config.min_bigram_score = v;
        }
        if let Some(v) = self.mser {
            config.max_source_extraction_rate = v;
        }
        if let Some(v) = self.mled {
            config.max_left_expansion_distance = v;
        }
        if let Some(v) = self.mred {
            config.max_right_expansion_distance = v;
        }
        if let Some(v) = self.qdt {
            config.quality_decrease_threshold = v;
        }
        config
    }
}

/// `build-transducer` — build and persist a QUTD v1 transducer from a sorted
/// `key<TAB>value` file.
#[derive(Parser, Debug)]
#[command(name = "build-transducer")]
#[command(about = "Build a minimal FST transducer and persist it in QUTD v1 format")]
pub struct BuildTransducerArgs {
    /// Log verbosity passed to the tracing filter.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Sorted `key<TAB>value` input file.
    #[arg(long = "in", default_value = "src-transducer")]
    pub input: PathBuf,

    /// Destination QUTD v1 file.
    #[arg(long = "out", default_value = "src-transducer-qutd")]
    pub output: PathBuf,

    /// After building, look every input key up in the result and report any
    /// that fail to resolve.
    #[arg(long)]
    pub self_test: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn extractor_config_overrides_only_given_flags() {
        let args = ExtractTermsArgs {
            log_level: "info".to_string(),
            language: None,
            file: Vec::new(),
            mbf: Some(7),
            mbs: None,
            mser: None,
            mled: None,
            mred: None,
            qdt: None,
        };
        let config = args.extractor_config();
        check!(config.min_bigram_frequency == 7);
        check!(config.min_bigram_score == ExtractorConfig::default().min_bigram_score);
    }
}
