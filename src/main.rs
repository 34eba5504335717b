// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (to stderr, so --json output on stdout stays clean)
// 3. Get the documents (download them, read a file, or take hrefs as-is)
// 4. Classify their links and print the buckets
// 5. Exit with proper code (0 = success, 1 = some documents failed, 2 = error)
// =============================================================================

mod cli;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, OutputArgs};
use link_sorter::links::lossless_utf8;
use link_sorter::{fetch, html, LinkBuckets, LinkClassifier, Reference, ResolvedUrl};

// The classified links of one document
#[derive(Debug, Serialize)]
struct DocumentReport {
    /// The URL links were resolved against (after redirects)
    document: String,
    #[serde(flatten)]
    links: LinkBuckets,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr; RUST_LOG wins over --verbose
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "link_sorter=debug" } else { "link_sorter=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = every document was classified
//   Ok(1) = some documents could not be fetched
//   Err   = bad arguments or an unreadable input
async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Fetch {
            urls,
            timeout,
            concurrency,
            output,
        } => handle_fetch(urls, timeout, concurrency, &output).await,
        Commands::File { path, url, output } => handle_file(&path, &url, &output).await,
        Commands::Refs {
            url,
            base,
            references,
            output,
        } => handle_refs(&url, base.as_deref(), &references, &output),
    }
}

// Handles the 'fetch' subcommand
async fn handle_fetch(
    urls: Vec<String>,
    timeout: u64,
    concurrency: usize,
    output: &OutputArgs,
) -> Result<i32> {
    let client = fetch::build_client(Duration::from_secs(timeout))?;
    let classifier = LinkClassifier::new(output.classifier_config());

    let mut reports = Vec::new();
    let mut failed = 0;
    for (requested, result) in fetch::fetch_pages(&client, urls, concurrency).await {
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to fetch {}: {:#}", requested, e);
                failed += 1;
                continue;
            }
        };

        match ResolvedUrl::parse(&page.url) {
            Ok(document) => reports.push(classify_html(&classifier, &document, &page.html)),
            Err(e) => {
                warn!("Skipping {}: {}", requested, e);
                failed += 1;
            }
        }
    }

    print_reports(&reports, output.json)?;
    Ok(if failed > 0 { 1 } else { 0 })
}

// Handles the 'file' subcommand
async fn handle_file(path: &Path, url: &str, output: &OutputArgs) -> Result<i32> {
    let classifier = LinkClassifier::new(output.classifier_config());
    let report = classify_file(&classifier, path, url).await?;

    print_reports(&[report], output.json)?;
    Ok(0)
}

// Reads a saved page and classifies its links
//
// The file is read as bytes: pages saved in Latin-1 or another legacy
// charset still get classified, with the bytes that aren't valid UTF-8
// kept as %XX escapes.
async fn classify_file(classifier: &LinkClassifier, path: &Path, url: &str) -> Result<DocumentReport> {
    let document = ResolvedUrl::parse(url)?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let html = lossless_utf8(&bytes);
    Ok(classify_html(classifier, &document, &html))
}

// Handles the 'refs' subcommand
fn handle_refs(
    url: &str,
    base: Option<&str>,
    references: &[String],
    output: &OutputArgs,
) -> Result<i32> {
    let document = ResolvedUrl::parse(url)?;
    let classifier = LinkClassifier::new(output.classifier_config());

    let references: Vec<Reference> = references.iter().map(|r| Reference::from(r.as_str())).collect();
    let report = DocumentReport {
        document: document.to_string(),
        links: classifier.classify(&references, &document, base),
    };

    print_reports(&[report], output.json)?;
    Ok(0)
}

fn classify_html(classifier: &LinkClassifier, document: &ResolvedUrl, html: &str) -> DocumentReport {
    let page = html::extract_references(html);
    let links = classifier.classify(&page.hrefs, document, page.base.as_deref());

    info!(
        "{}: {} href(s), {} classified",
        document,
        page.hrefs.len(),
        links.len()
    );

    DocumentReport {
        document: document.to_string(),
        links,
    }
}

// Prints the reports either as a listing or JSON
//
// A single report is printed as a bare object, several as an array.
fn print_reports(reports: &[DocumentReport], json: bool) -> Result<()> {
    if json {
        let json_output = match reports {
            [single] => serde_json::to_string_pretty(single)?,
            _ => serde_json::to_string_pretty(reports)?,
        };
        println!("{}", json_output);
    } else {
        for report in reports {
            print_listing(report);
        }
    }
    Ok(())
}

// Prints one document's buckets in a human-readable form
fn print_listing(report: &DocumentReport) {
    println!("📄 {}", report.document);

    print_bucket("🏠 Internal", &report.links.internal);
    print_bucket("🌐 External", &report.links.external);
    print_bucket("✉️  Non-HTTP", &report.links.non_http);

    println!("📊 Summary:");
    println!("   Internal: {}", report.links.internal.len());
    println!("   External: {}", report.links.external.len());
    println!("   Non-HTTP: {}", report.links.non_http.len());
    println!("   📋 Total: {}", report.links.len());
    println!();
}

fn print_bucket(title: &str, links: &[String]) {
    println!("{} ({})", title, links.len());
    for link in links {
        println!("   {}", link);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_html_uses_declared_base() {
        let document = ResolvedUrl::parse("http://relativewithbase.com/company/page2").unwrap();
        let html = r#"
            <head><base href="http://relativewithbase.com/"></head>
            <body>
                <a href="about">About</a>
                <a href="/sitemap">Sitemap</a>
                <a href="https://github.com/">GitHub</a>
                <a href="mailto:hi@relativewithbase.com">Mail</a>
            </body>
        "#;
        let report = classify_html(&LinkClassifier::default(), &document, html);

        assert_eq!(report.document, "http://relativewithbase.com/company/page2");
        assert_eq!(
            report.links.internal,
            vec!["http://relativewithbase.com/about", "http://relativewithbase.com/sitemap"]
        );
        assert_eq!(report.links.external, vec!["https://github.com/"]);
        assert_eq!(report.links.non_http, vec!["mailto:hi@relativewithbase.com"]);
    }

    #[test]
    fn test_report_json_shape() {
        let report = DocumentReport {
            document: "http://example.com/".to_string(),
            links: LinkBuckets {
                internal: vec!["http://example.com/faqs".to_string()],
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["document"], "http://example.com/");
        assert_eq!(json["internal"][0], "http://example.com/faqs");
        assert!(json["external"].as_array().unwrap().is_empty());
        assert!(json["non_http"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_file_missing_path() {
        let output = OutputArgs {
            json: true,
            malformed: Default::default(),
        };
        let result = handle_file(Path::new("/nonexistent/page.html"), "http://example.com/", &output).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_classify_file_keeps_invalid_utf8_as_escapes() {
        let path = std::env::temp_dir().join(format!("link-sorter-latin1-{}.html", std::process::id()));
        tokio::fs::write(&path, b"<a href=\"/caf\xe9\">x</a><a href=\"/faqs\">y</a>".as_slice())
            .await
            .unwrap();

        let report = classify_file(&LinkClassifier::default(), &path, "http://example.com/").await;
        tokio::fs::remove_file(&path).await.unwrap();

        let report = report.unwrap();
        assert_eq!(
            report.links.internal,
            vec!["http://example.com/caf%E9", "http://example.com/faqs"]
        );
    }

    #[test]
    fn test_handle_refs_rejects_relative_document_url() {
        let output = OutputArgs {
            json: false,
            malformed: Default::default(),
        };
        let result = handle_refs("/relative", None, &["/a".to_string()], &output);
        assert!(result.is_err());
    }
}
