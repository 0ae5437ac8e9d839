//! CLI: JSON documents → bundled records
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use mapto::convert::Converter;
use mapto::demo::{Manifest, Person};
use mapto::{RecordConverter, Reflect};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// convert JSON/NDJSON documents into typed records and print them back as JSON
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// trace compilation and conversion (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// convert every input document into the chosen record
    Convert(ConvertOut),
    /// print the compiled conversion plan of a record
    Plan(PlanOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ConvertOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// target record
    #[arg(long, value_enum)]
    record: RecordName,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct PlanOut {
    /// record to compile
    #[arg(long, value_enum)]
    record: RecordName,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum RecordName {
    Person,
    Manifest,
}

/// One decoded input document.
struct Document {
    /// `path` or `path:line` for NDJSON
    label: String,
    value: serde_json::Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            if self.ndjson {
                for (line_no, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let label = format!("{source_path_str}:{}", line_no + 1);
                    let value = serde_json::from_str::<serde_json::Value>(line)
                        .with_context(|| format!("failed to parse JSON line ({label})"))?;
                    documents.push(self.select(label, value)?);
                }
            } else {
                let value = serde_json::from_str::<serde_json::Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                documents.push(self.select(source_path_str, value)?);
            }
        }
        Ok(documents)
    }

    fn select(&self, label: String, value: serde_json::Value) -> Result<Document> {
        let Some(pointer) = self.json_pointer.as_deref() else {
            return Ok(Document { label, value });
        };
        match value.pointer(pointer) {
            Some(node) => Ok(Document { label, value: node.clone() }),
            None => bail!("JSON pointer {pointer} selects nothing in {label}"),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        init_tracing(self.verbose);
        match &self.cmd {
            Command::Convert(target) => {
                let documents = target.input_settings.load_documents()?;
                tracing::debug!(documents = documents.len(), record = ?target.record, "converting");
                let results = match target.record {
                    RecordName::Person => convert_all::<Person>(&documents)?,
                    RecordName::Manifest => convert_all::<Manifest>(&documents)?,
                };
                target.report(&documents, results)
            }
            Command::Plan(target) => {
                let root = match target.record {
                    RecordName::Person => mapto::compile::<Person>()?,
                    RecordName::Manifest => mapto::compile::<Manifest>()?,
                };
                for record in reachable_records(&root) {
                    println!("{record}");
                }
                Ok(())
            }
        }
    }
}

impl ConvertOut {
    fn report(&self, documents: &[Document], results: Vec<Result<serde_json::Value>>) -> Result<()> {
        let mut converted = Vec::with_capacity(results.len());
        let mut failures = 0usize;
        for (document, result) in documents.iter().zip(results) {
            match result {
                Ok(value) => {
                    eprintln!("{} {}", "converted".green(), document.label);
                    converted.push(value);
                }
                Err(error) => {
                    failures += 1;
                    eprintln!("{} {}: {error:#}", "failed".red().bold(), document.label);
                }
            }
        }

        let output = serde_json::to_string_pretty(&converted)?;
        if let Some(out) = self.out.as_ref() {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, &output).with_context(|| format!("failed to write {}", out.display()))?;
        } else {
            println!("{output}");
        }

        if failures > 0 {
            bail!("{failures} of {} documents failed to convert", documents.len());
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "mapto=trace" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .init();
}

/// Compile `T` once, then convert every document in parallel.
fn convert_all<T>(documents: &[Document]) -> Result<Vec<Result<serde_json::Value>>>
where
    T: Reflect + Serialize,
{
    let converter = mapto::compile::<T>()?;
    Ok(documents
        .par_iter()
        .map(|document| -> Result<serde_json::Value> {
            let src = mapto::Value::from(document.value.clone());
            let record: T = converter.generate(&src)?;
            Ok(serde_json::to_value(&record)?)
        })
        .collect())
}

/// The root plan followed by every record it reaches, each listed once.
fn reachable_records(root: &RecordConverter) -> Vec<RecordConverter> {
    fn visit(owner: &RecordConverter, converter: &Converter, out: &mut Vec<RecordConverter>) {
        match converter {
            Converter::Record(record) => push(owner.resolve(record), out),
            Converter::Optional(c) => visit(owner, &c.inner, out),
            Converter::Sequence(c) => visit(owner, &c.inner, out),
            Converter::Map(c) => visit(owner, &c.inner, out),
            Converter::Scalar(_) | Converter::Dynamic => {}
        }
    }
    fn push(record: RecordConverter, out: &mut Vec<RecordConverter>) {
        if out.iter().any(|seen| seen.name() == record.name()) {
            return;
        }
        out.push(record.clone());
        for rule in record.rules() {
            visit(&record, &rule.converter, out);
        }
    }

    let mut out = Vec::new();
    push(root.clone(), &mut out);
    out
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //
