//! Command-line interface for xmlislands

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use xmlislands::islands::{IslandSchema, TopLevel};
#[cfg(feature = "cli")]
use xmlislands::names::is_valid_ncname;
#[cfg(feature = "cli")]
use xmlislands::rules::{RuleSchema, TAG_PROPERTY, TEXT_FEATURE};
#[cfg(feature = "cli")]
use xmlislands::validation::Validator;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xmlislands")]
#[command(author, version, about = "Multi-namespace XML validation with island schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an XML document against rule schemas
    Validate {
        /// Rule schema files (JSON), one per namespace
        #[arg(short, long = "schema", value_name = "SCHEMA", required = true)]
        schemas: Vec<PathBuf>,

        /// Namespace that must validate the document element, optionally
        /// restricted to some declarations: NS or NS=DECL,DECL
        #[arg(short, long, value_name = "ROOT")]
        root: Option<String>,

        /// Output the report as JSON
        #[arg(short, long)]
        json: bool,

        /// Path to the XML file to validate
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Inspect a rule schema and list what it exports
    Inspect {
        /// Path to the rule schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            schemas,
            root,
            json,
            file,
        } => cmd_validate(schemas, root, json, file),
        Commands::Inspect { schema, json } => cmd_inspect(schema, json),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Parse `NS` or `NS=DECL,DECL`. The split happens at the last `=` only if
/// what follows is a list of names, so namespaces may contain `=`.
#[cfg(feature = "cli")]
fn parse_root(root: &str) -> TopLevel {
    if let Some((namespace, decls)) = root.rsplit_once('=') {
        let decls: Vec<String> = decls.split(',').map(|d| d.trim().to_string()).collect();
        if decls.iter().all(|d| is_valid_ncname(d)) {
            return TopLevel::Island {
                namespace: namespace.to_string(),
                decls,
            };
        }
    }
    TopLevel::Island {
        namespace: root.to_string(),
        decls: Vec::new(),
    }
}

#[cfg(feature = "cli")]
fn cmd_validate(
    schema_paths: Vec<PathBuf>,
    root: Option<String>,
    json_output: bool,
    file: PathBuf,
) -> Result<bool, Box<dyn std::error::Error>> {
    let schemas = schema_paths
        .iter()
        .map(|path| {
            RuleSchema::from_file(path)
                .map_err(|e| format!("cannot load schema '{}': {}", path.display(), e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let top_level = root.as_deref().map(parse_root).unwrap_or_default();
    let validator = Validator::from_rule_schemas(schemas, top_level)?;
    let report = validator.validate_file(&file)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.valid {
        println!("✓ {} is valid", file.display());
    } else {
        println!("✗ {} is invalid", file.display());
        println!();
        println!("Errors:");
        for diagnostic in &report.diagnostics {
            println!("  - {}", diagnostic);
        }
    }

    Ok(report.valid)
}

#[cfg(feature = "cli")]
fn cmd_inspect(schema_path: PathBuf, json_output: bool) -> Result<bool, Box<dyn std::error::Error>> {
    use serde_json::{json, Map, Value};

    let schema = RuleSchema::from_file(&schema_path)?;

    if json_output {
        let mut output = Map::new();
        output.insert("namespace".to_string(), json!(schema.namespace()));

        let elements: Vec<Value> = schema
            .element_decls()
            .iter()
            .map(|decl| {
                json!({
                    "name": decl.name(),
                    "tag": decl.property(TAG_PROPERTY).ok(),
                    "text": decl.feature(TEXT_FEATURE).ok(),
                })
            })
            .collect();
        output.insert("elements".to_string(), Value::Array(elements));

        let attributes: Vec<Value> = schema
            .attributes_decls()
            .iter()
            .map(|decl| json!(decl.name()))
            .collect();
        output.insert("attributes".to_string(), Value::Array(attributes));

        println!("{}", serde_json::to_string_pretty(&Value::Object(output))?);
    } else {
        println!("xmlislands v{}", xmlislands::VERSION);
        println!();
        println!("Schema Information:");
        println!("  Namespace: {}", schema.namespace());
        println!("  Exported Elements: {}", schema.element_decls().len());
        println!("  Exported Attribute Sets: {}", schema.attributes_decls().len());

        println!("\n=== Exported Elements ===");
        for decl in schema.element_decls() {
            let text = if decl.feature(TEXT_FEATURE).unwrap_or(false) {
                " (text)"
            } else {
                ""
            };
            println!("  {}{}", decl.name(), text);
        }

        if !schema.attributes_decls().is_empty() {
            println!("\n=== Exported Attribute Sets ===");
            for decl in schema.attributes_decls() {
                println!("  {}", decl.name());
            }
        }
    }

    Ok(true)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
