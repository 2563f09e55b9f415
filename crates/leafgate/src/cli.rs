use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use leafgate_entry::{Entry, EntryAssembler, Leaf, MemoryLog, Submission, UrlHashPolicy};
use leafgate_fetch::ReqwestClient;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "leafgate", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// TOML configuration file with [fetch] and [verify] tables
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Verify a submission and print the resulting leaf
    #[command(alias = "v", name = "verify")]
    Verify(VerifyArg),
}

#[derive(Debug, clap::Args)]
pub struct VerifyArg {
    /// Submission JSON with base64 byte fields; `-` reads stdin
    #[arg(long, conflicts_with_all = ["data_file", "url", "sha", "signature", "public_key"])]
    submission: Option<PathBuf>,

    /// File holding the content
    #[arg(long, conflicts_with = "url")]
    data_file: Option<PathBuf>,

    /// URL to fetch the content from
    #[arg(long)]
    url: Option<String>,

    /// Declared SHA-256 of the content, hex
    #[arg(long)]
    sha: Option<String>,

    /// Detached signature, armored or binary
    #[arg(long, required_unless_present = "submission")]
    signature: Option<PathBuf>,

    /// Public key, armored or binary
    #[arg(long, required_unless_present = "submission")]
    public_key: Option<PathBuf>,

    /// Accept URL content without a declared sha
    #[arg(long)]
    trust_fetched: bool,

    /// Append the leaf to an in-memory log and print the status
    #[arg(long)]
    append: bool,
}

impl VerifyArg {
    pub async fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut options = config.verify_options();
        if self.trust_fetched {
            options = options.url_policy(UrlHashPolicy::TrustFetched);
        }
        let client = ReqwestClient::with_timeouts(config.timeouts())?;
        let assembler = EntryAssembler::new(client, options);
        let append = self.append;
        let entry = self.into_entry()?;

        if append {
            let log = MemoryLog::new();
            let (leaf, status) = assembler.submit(entry, &log).await?;
            print_leaf(&leaf)?;
            println!("{status}");
        } else {
            let leaf = assembler.assemble(entry).await?;
            print_leaf(&leaf)?;
        }
        Ok(())
    }

    fn into_entry(self) -> anyhow::Result<Entry> {
        if let Some(path) = &self.submission {
            let raw = read_input(path)?;
            let submission = Submission::from_json(&raw).with_context(|| format!("decoding {}", path.display()))?;
            return Ok(Entry::from(submission));
        }

        let mut entry = Entry::default();
        if let Some(path) = &self.data_file {
            entry.data = read_input(path)?.into();
        }
        if let Some(url) = self.url {
            entry.url = url;
        }
        if let Some(sha) = self.sha {
            entry.sha = sha;
        }
        if let Some(path) = &self.signature {
            entry.signature = read_input(path)?.into();
        }
        if let Some(path) = &self.public_key {
            entry.public_key = read_input(path)?.into();
        }
        Ok(entry)
    }
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf).context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn print_leaf(leaf: &Leaf) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(leaf)?);
    Ok(())
}
