//! Minimal CLI: check JSON documents against a record schema
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::descriptor::TypeDescriptor;
use crate::error::{CheckError, TypeValidationError};
use crate::lower::{lower_record, LowerError};
use crate::schema::RecordSchema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate that every field of a record holds a value of its declared type
#[derive(Parser, Debug)]
#[command(name = "record-typecheck", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// check JSON/NDJSON documents against a record schema
    Check(CheckOut),
    /// parse type descriptors and print their canonical form
    Describe(DescribeOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is checked as a record.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// record schema (.json) declaring the field types
    #[arg(long, short)]
    schema: PathBuf,

    /// treat unrecognized type descriptors as errors (in addition to the schema's own option)
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// print one JSON object per document instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    /// descriptors such as 'Dict[str, List[int]]'
    #[arg(required = true)]
    descriptors: Vec<String>,
}

/// Per-document verdict.
#[derive(Debug)]
enum Outcome {
    Passed,
    Failed(TypeValidationError),
    NotARecord(LowerError),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(String, serde_json::Value)) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        for source_path in source_paths {
            let label = source_path.display().to_string();
            let source = if label == "-" {
                std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
            } else {
                std::fs::read_to_string(&source_path)
                    .with_context(|| format!("failed to read source file {label}"))?
            };
            if self.ndjson {
                for (i, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let line_label = format!("{label}:{}", i + 1);
                    let json_value = serde_json::from_str::<serde_json::Value>(line)
                        .with_context(|| format!("failed to parse JSON ({line_label})"))?;
                    self.select(line_label, json_value, &mut apply)?;
                }
            } else {
                let json_value = serde_json::from_str::<serde_json::Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({label})"))?;
                self.select(label, json_value, &mut apply)?;
            }
        }
        Ok(())
    }

    fn select(
        &self,
        label: String,
        json_value: serde_json::Value,
        apply: &mut impl FnMut(String, serde_json::Value),
    ) -> Result<()> {
        let json_value = match self.json_pointer.as_deref() {
            None => json_value,
            Some(ptr) => json_value
                .pointer(ptr)
                .cloned()
                .with_context(|| format!("JSON pointer {ptr} matched nothing in {label}"))?,
        };
        match self.jq_expr.as_deref() {
            None => apply(label, json_value),
            Some(jq_expr) => {
                let result = crate::jq_exec::run_jaq(jq_expr, &json_value)
                    .with_context(|| format!("failed to apply jq expression to {label}"))?;
                for (i, json_value) in result.into_iter().enumerate() {
                    apply(format!("{label}#{i}"), json_value);
                }
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// `Ok(true)` if everything checked out, `Ok(false)` if some document or
    /// descriptor was rejected.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(target) => target.run(),
            Command::Describe(target) => Ok(target.run()),
        }
    }
}

impl CheckOut {
    fn run(&self) -> Result<bool> {
        let schema = RecordSchema::load(&self.schema)?;
        tracing::debug!(record = %schema.name, fields = schema.fields.len(), "loaded schema");
        schema
            .check_declarations(self.strict)
            .with_context(|| format!("schema {} is not usable", self.schema.display()))?;

        let mut documents = Vec::new();
        self.input_settings.load_process(|label, value| documents.push((label, value)))?;

        let outcomes = documents
            .par_iter()
            .map(|(_, doc)| check_document(&schema, doc, self.strict))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("schema {} is not usable", self.schema.display()))?;

        let mut failed = 0usize;
        for ((label, _), outcome) in documents.iter().zip(&outcomes) {
            if !matches!(outcome, Outcome::Passed) {
                failed += 1;
            }
            if self.json {
                println!("{}", render_json(label, outcome));
            } else {
                print!("{}", render_text(label, outcome));
            }
        }
        if !self.json {
            let summary = format!("{} documents checked, {failed} failed", outcomes.len());
            println!("{}", if failed == 0 { summary.green() } else { summary.red() });
        }
        Ok(failed == 0)
    }
}

impl DescribeOut {
    fn run(&self) -> bool {
        let mut all_ok = true;
        for src in &self.descriptors {
            match src.parse::<TypeDescriptor>() {
                Ok(d) => match d.find_unrecognized() {
                    None => println!("{src} => {d}"),
                    Some(raw) => println!("{src} => {d} {}", format!("(unrecognized: {raw})").yellow()),
                },
                Err(error) => {
                    all_ok = false;
                    println!("{src} => {}", format!("error: {error}").red());
                }
            }
        }
        all_ok
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn check_document(
    schema: &RecordSchema,
    doc: &serde_json::Value,
    strict: bool,
) -> Result<Outcome, crate::error::ConfigurationError> {
    let record = match lower_record(&schema.name, doc) {
        Ok(r) => r,
        Err(error) => return Ok(Outcome::NotARecord(error)),
    };
    match schema.check(&record, strict) {
        Ok(()) => Ok(Outcome::Passed),
        Err(CheckError::Type(e)) => Ok(Outcome::Failed(e)),
        Err(CheckError::Configuration(e)) => Err(e),
    }
}

fn render_text(label: &str, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Passed => format!("{} {label}\n", "ok  ".green()),
        Outcome::NotARecord(error) => format!("{} {label}: {error}\n", "FAIL".red()),
        Outcome::Failed(e) => {
            let mut s = format!("{} {label}\n", "FAIL".red());
            for (field, message) in e.errors() {
                s.push_str(&format!("    {}: {message}\n", field.bold()));
            }
            s
        }
    }
}

fn render_json(label: &str, outcome: &Outcome) -> serde_json::Value {
    match outcome {
        Outcome::Passed => serde_json::json!({ "document": label, "valid": true }),
        Outcome::NotARecord(error) => serde_json::json!({
            "document": label,
            "valid": false,
            "error": error.to_string(),
        }),
        Outcome::Failed(e) => serde_json::json!({
            "document": label,
            "valid": false,
            "errors": e.errors(),
        }),
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = glob::glob(pattern)?
                .collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                // explicit glob matching nothing is an error, not an empty run
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
            out.append(&mut matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SCHEMA: &str = r#"{
        "name": "Person",
        "fields": { "name": "str", "age": "int", "tags": "List[str]" }
    }"#;

    fn cli(args: &[&str]) -> CommandLineInterface {
        CommandLineInterface::try_parse_from(std::iter::once("record-typecheck").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn check_reports_failing_documents() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("person.json");
        fs::write(&schema, SCHEMA).unwrap();
        fs::write(dir.path().join("a.data.json"), r#"{"name": "Alice", "age": 30, "tags": []}"#).unwrap();
        fs::write(dir.path().join("b.data.json"), r#"{"name": "Bob", "age": "30", "tags": ["x", 1]}"#).unwrap();

        let pattern = dir.path().join("*.data.json");
        let schema = schema.to_str().unwrap();
        let pattern = pattern.to_str().unwrap();

        assert!(!cli(&["check", "-s", schema, "-i", pattern]).run().unwrap());
        let ok_only = dir.path().join("a.data.json");
        assert!(cli(&["check", "-s", schema, "-i", ok_only.to_str().unwrap()]).run().unwrap());
    }

    #[test]
    fn ndjson_and_jq_select_records() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("person.json");
        fs::write(&schema, SCHEMA).unwrap();
        let data = dir.path().join("people.ndjson");
        fs::write(
            &data,
            "{\"people\": [{\"name\": \"A\", \"age\": 1, \"tags\": []}]}\n\n{\"people\": []}\n",
        )
        .unwrap();

        let settings = InputSettings {
            ndjson: true,
            json_pointer: None,
            jq_expr: Some(".people[]".to_string()),
            input: vec![data.to_str().unwrap().to_string()],
        };
        let mut labels = Vec::new();
        settings.load_process(|label, _| labels.push(label)).unwrap();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].ends_with("people.ndjson:1#0"));

        let run = cli(&[
            "check", "-s", schema.to_str().unwrap(), "-i", data.to_str().unwrap(),
            "--ndjson", "--jq-expr", ".people[]",
        ]);
        assert!(run.run().unwrap());
    }

    #[test]
    fn json_pointer_selects_a_subdocument() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("doc.json");
        fs::write(&data, r#"{"payload": {"name": "A"}}"#).unwrap();
        let mut settings = InputSettings {
            ndjson: false,
            json_pointer: Some("/payload".to_string()),
            jq_expr: None,
            input: vec![data.to_str().unwrap().to_string()],
        };
        let mut docs = Vec::new();
        settings.load_process(|_, v| docs.push(v)).unwrap();
        assert_eq!(docs, vec![serde_json::json!({"name": "A"})]);

        settings.json_pointer = Some("/missing".to_string());
        assert!(settings.load_process(|_, _| {}).is_err());
    }

    #[test]
    fn unusable_schema_is_an_error_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("pair.json");
        fs::write(&schema, r#"{"name": "P", "fields": {"p": "Tuple[int, int]"}}"#).unwrap();
        let data = dir.path().join("p.json");
        fs::write(&data, r#"{"p": [1, 2]}"#).unwrap();
        let (schema, data) = (schema.to_str().unwrap(), data.to_str().unwrap());

        assert!(cli(&["check", "-s", schema, "-i", data]).run().unwrap());
        assert!(cli(&["check", "-s", schema, "-i", data, "--strict"]).run().is_err());
    }

    #[test]
    fn strict_schema_is_rejected_without_any_records() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("pair.json");
        fs::write(&schema, r#"{"name": "P", "fields": {"p": "List[Tuple[int]]"}}"#).unwrap();
        let empty = dir.path().join("empty.ndjson");
        fs::write(&empty, "").unwrap();
        let scalars = dir.path().join("scalars.ndjson");
        fs::write(&scalars, "1\n\"x\"\n").unwrap();
        let schema = schema.to_str().unwrap();

        for data in [&empty, &scalars] {
            let data = data.to_str().unwrap();
            assert!(cli(&["check", "-s", schema, "-i", data, "--ndjson", "--strict"]).run().is_err());
        }
        let data = empty.to_str().unwrap();
        assert!(cli(&["check", "-s", schema, "-i", data, "--ndjson"]).run().unwrap());
    }

    #[test]
    fn glob_matching_nothing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("*.json");
        assert!(resolve_file_path_patterns([pattern.to_str().unwrap()]).is_err());
        assert_eq!(resolve_file_path_patterns(["plain.json"]).unwrap(), vec![PathBuf::from("plain.json")]);
    }

    #[test]
    fn renders_field_errors() {
        colored::control::set_override(false);
        let mut errors = indexmap::IndexMap::new();
        errors.insert("age".to_string(), "must be an instance of Int, but received String".to_string());
        let outcome = Outcome::Failed(TypeValidationError::new(errors));
        assert_eq!(
            render_text("b.json", &outcome),
            "FAIL b.json\n    age: must be an instance of Int, but received String\n"
        );
        assert_eq!(
            render_json("b.json", &outcome),
            serde_json::json!({
                "document": "b.json",
                "valid": false,
                "errors": {"age": "must be an instance of Int, but received String"},
            })
        );
    }

    #[test]
    fn describe_flags_parse_errors() {
        assert!(cli(&["describe", "Dict[str, List[int]]", "Tuple[int]"]).run().unwrap());
        assert!(!cli(&["describe", "List[int"]).run().unwrap());
    }
}
