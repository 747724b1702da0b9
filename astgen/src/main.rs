use std::{fs, path::PathBuf, process::exit};

use clap::Parser;
use console::style;
use regex::Regex;

/// Generates the expression data shapes from a textual description.
///
/// Each non-blank input line describes one shape, e.g.
/// `Binary - left: Expr, operator: Token, right: Expr`. The output is a
/// Rust source file defining the `Expression` enum and its constructors.
#[derive(Parser)]
#[command(name = "lox-astgen")]
struct Args {
    /// Shape description file
    input: PathBuf,
    /// Where to write the generated Rust source
    output: PathBuf,
}

fn main() {
    let args = Args::parse();

    let description = match fs::read_to_string(&args.input) {
        Ok(description) => description,
        Err(err) => {
            eprintln!("{}: {}", style("error").red(), err);
            exit(64);
        }
    };

    let source = match generate(&description) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("{}: {}", style("error").red(), message);
            exit(65);
        }
    };

    if let Err(err) = fs::write(&args.output, source) {
        eprintln!("{}: {}", style("error").red(), err);
        exit(74);
    }
}

/// DSL type spellings and the Rust types they map to. `Expr` boxes itself
/// so the shapes can recurse.
fn field_type(dsl_type: &str) -> Option<&'static str> {
    match dsl_type {
        "Expr" => Some("Box<Expression>"),
        "Token" => Some("Token"),
        "Any" => Some("Literal"),
        _ => None,
    }
}

fn generate(description: &str) -> Result<String, String> {
    let shape_pattern = Regex::new(r"^\s*([A-Za-z]\w*)\s*-\s*(.+)$").unwrap();

    let mut shapes = Vec::new();
    for line in description.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let captures = shape_pattern
            .captures(line)
            .ok_or_else(|| format!("malformed shape description: '{}'", line.trim()))?;
        let name = captures[1].to_string();

        let mut fields = Vec::new();
        for field in captures[2].split(',') {
            let (field_name, dsl_type) = field
                .split_once(':')
                .ok_or_else(|| format!("malformed field in '{}': '{}'", name, field.trim()))?;
            let rust_type = field_type(dsl_type.trim())
                .ok_or_else(|| format!("unknown type '{}' in shape '{}'", dsl_type.trim(), name))?;
            fields.push((field_name.trim().to_string(), rust_type));
        }

        shapes.push((name, fields));
    }

    if shapes.is_empty() {
        return Err("no shapes in description".to_string());
    }

    let mut source = String::new();
    source.push_str("use crate::token::Token;\n");
    source.push_str("use crate::types::Literal;\n\n");
    source.push_str("#[derive(Debug, Clone)]\n");
    source.push_str("pub enum Expression {\n");
    for (name, fields) in &shapes {
        source.push_str(&format!("    {} {{\n", name));
        for (field_name, rust_type) in fields {
            source.push_str(&format!("        {}: {},\n", field_name, rust_type));
        }
        source.push_str("    },\n");
    }
    source.push_str("}\n\n");

    source.push_str("impl Expression {\n");
    for (i, (name, fields)) in shapes.iter().enumerate() {
        if i > 0 {
            source.push('\n');
        }

        let params = fields
            .iter()
            .map(|(field_name, rust_type)| format!("{}: {}", field_name, rust_type))
            .collect::<Vec<_>>()
            .join(", ");
        source.push_str(&format!(
            "    pub fn {}({}) -> Self {{\n",
            name.to_lowercase(),
            params
        ));
        source.push_str(&format!("        Expression::{} {{\n", name));
        for (field_name, _) in fields {
            source.push_str(&format!("            {},\n", field_name));
        }
        source.push_str("        }\n");
        source.push_str("    }\n");
    }
    source.push_str("}\n");

    Ok(source)
}
