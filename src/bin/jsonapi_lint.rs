//! jsonapi-lint: Check the structure of JSON:API request documents
//!
//! Runs the binder's envelope checks without a resource registry: body
//! parses, primary data is present, included (type, id) pairs are unique,
//! and every relationship linkage is either satisfied by the included pool or
//! left as a placeholder.
//!
//! Usage:
//!   # Read from file, output to stdout
//!   jsonapi-lint request.json
//!
//!   # Read from stdin
//!   echo '{"data": {"type": "articles", "id": "1"}}' | jsonapi-lint
//!
//!   # One document per line, compact output
//!   jsonapi-lint --ndjson captured.jsonl --compact

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use jsonapi_binder::document::{self, Document, Envelope, PrimaryData, ResourceObject};
use jsonapi_binder::BindError;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs::File;
use std::io::{stdin, BufRead, BufReader, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jsonapi-lint")]
#[command(about = "Check the structure of JSON:API request documents", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one document per line)
    #[arg(long)]
    ndjson: bool,

    /// Accept bulk `operations` bodies
    #[arg(long)]
    operations: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut reader: Box<dyn BufRead> = if let Some(file_path) = &args.input {
        let file = File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?;
        Box::new(BufReader::new(file))
    } else {
        Box::new(BufReader::new(stdin()))
    };

    let mut bodies = Vec::new();
    if args.ndjson {
        for line in reader.lines() {
            let line = line.context("Failed to read line")?;
            if line.trim().is_empty() {
                continue;
            }
            bodies.push(line);
        }
    } else {
        let mut body = String::new();
        reader.read_to_string(&mut body).context("Failed to read input")?;
        bodies.push(body);
    }

    let mut invalid = 0;
    for body in &bodies {
        let report = lint_body(body, args.operations);
        if report["valid"] == false {
            invalid += 1;
        }

        let output = if args.compact {
            serde_json::to_string(&report)?
        } else {
            serde_json::to_string_pretty(&report)?
        };
        println!("{}", output);
    }

    tracing::debug!(documents = bodies.len(), invalid, "lint finished");

    if invalid > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn lint_body(raw: &str, operations: bool) -> Value {
    match document::parse_envelope(raw, operations) {
        Err(e) => json!({"valid": false, "errors": [error_json(&e)]}),
        Ok(Envelope::Operations(doc)) => json!({
            "valid": true,
            "kind": "operations",
            "operations": doc.operations.len(),
        }),
        Ok(Envelope::Document(doc)) => lint_document(&doc),
    }
}

fn lint_document(doc: &Document) -> Value {
    let mut errors = Vec::new();

    let (kind, primary): (&str, Vec<&ResourceObject>) = match &doc.data {
        None => {
            errors.push(error_json(&BindError::UnprocessableDocument(
                "missing primary data".to_string(),
            )));
            ("empty", Vec::new())
        }
        Some(PrimaryData::One(resource)) => ("single", vec![&**resource]),
        Some(PrimaryData::Many(resources)) => ("list", resources.iter().collect()),
    };

    let mut referenced = HashSet::new();
    let mut linkages = Vec::new();

    for resource in &primary {
        let Some(relationships) = &resource.relationships else {
            continue;
        };

        for (name, relationship) in relationships {
            for identifier in relationship.identifiers() {
                let status = match document::find_included(identifier, doc.included()) {
                    Ok(Some(_)) => "included",
                    Ok(None) => "placeholder",
                    Err(e) => {
                        errors.push(error_json(&e));
                        "duplicate"
                    }
                };
                referenced.insert(identifier.clone());
                linkages.push(json!({
                    "from": {"type": resource.type_name, "id": resource.id},
                    "relationship": name,
                    "to": {"type": identifier.type_name, "id": identifier.id},
                    "status": status,
                }));
            }
        }
    }

    let unreferenced: Vec<Value> = doc
        .included()
        .iter()
        .filter(|resource| !referenced.contains(&resource.identifier()))
        .map(|resource| json!({"type": resource.type_name, "id": resource.id}))
        .collect();

    json!({
        "valid": errors.is_empty(),
        "kind": kind,
        "primary": primary
            .iter()
            .map(|resource| json!({"type": resource.type_name, "id": resource.id}))
            .collect::<Vec<_>>(),
        "included": doc.included().len(),
        "linkages": linkages,
        "unreferenced_included": unreferenced,
        "errors": errors,
    })
}

fn error_json(err: &BindError) -> Value {
    json!({
        "kind": format!("{:?}", err.kind()),
        "status": err.status(),
        "message": err.to_string(),
    })
}
