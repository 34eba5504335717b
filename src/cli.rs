// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Three ways to feed the classifier:
// - fetch: download one or more pages and classify their links
// - file:  classify the links of a saved HTML file
// - refs:  classify href values given directly on the command line
// =============================================================================

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use link_sorter::{ClassifierConfig, MalformedPolicy};

#[derive(Parser, Debug)]
#[command(
    name = "link-sorter",
    version,
    about = "Resolve the links of a web page and sort them into internal, external and non-HTTP",
    long_about = "link-sorter resolves every <a href> of a page against the page URL (or its <base href>) \
                  and groups the results by whether they stay on the same host, leave it, or are not \
                  web links at all (mailto:, javascript:, ftp:, ...)."
)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download pages and classify their links
    ///
    /// Example: link-sorter fetch https://example.com https://example.org/blog/
    Fetch {
        /// Page URLs (http or https)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// How many pages to download at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Classify the links of a local HTML file
    ///
    /// Example: link-sorter file page.html --url https://example.com/page.html
    File {
        /// Path to the HTML file
        path: PathBuf,

        /// The URL the page was served from
        #[arg(long)]
        url: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Classify href values given on the command line
    ///
    /// Example: link-sorter refs --url http://example.com/ /faqs mailto:a@b.com
    Refs {
        /// The URL of the document the links come from
        #[arg(long)]
        url: String,

        /// A <base href> declared by the document
        #[arg(long)]
        base: Option<String>,

        /// The href values, in document order
        #[arg(required = true)]
        references: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

// Flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output results in JSON format instead of a listing
    #[arg(long)]
    pub json: bool,

    /// What to do with hrefs that can't be resolved
    #[arg(long, value_enum, default_value_t = PolicyArg::Lenient)]
    pub malformed: PolicyArg,
}

// --malformed values, mapped onto the library's MalformedPolicy
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PolicyArg {
    /// Drop every href that can't be resolved
    Drop,
    /// Keep every broken href in non_http, percent-encoded
    Encode,
    /// Keep a broken href only if it still looks like a non-web link
    #[default]
    Lenient,
}

impl From<PolicyArg> for MalformedPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Drop => MalformedPolicy::Drop,
            PolicyArg::Encode => MalformedPolicy::Encode,
            PolicyArg::Lenient => MalformedPolicy::Lenient,
        }
    }
}

impl OutputArgs {
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            malformed_policy: self.malformed.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_refs() {
        let cli = Cli::parse_from([
            "link-sorter",
            "refs",
            "--url",
            "http://example.com/",
            "--malformed",
            "drop",
            "/faqs",
            "mailto:a@b.com",
        ]);
        match cli.command {
            Commands::Refs {
                url,
                base,
                references,
                output,
            } => {
                assert_eq!(url, "http://example.com/");
                assert_eq!(base, None);
                assert_eq!(references, vec!["/faqs", "mailto:a@b.com"]);
                assert_eq!(output.classifier_config().malformed_policy, MalformedPolicy::Drop);
                assert!(!output.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_fetch_defaults() {
        let cli = Cli::parse_from(["link-sorter", "fetch", "https://example.com", "--json"]);
        match cli.command {
            Commands::Fetch {
                urls,
                timeout,
                concurrency,
                output,
            } => {
                assert_eq!(urls, vec!["https://example.com"]);
                assert_eq!(timeout, 10);
                assert_eq!(concurrency, 4);
                assert!(output.json);
                assert_eq!(output.classifier_config(), ClassifierConfig::default());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
