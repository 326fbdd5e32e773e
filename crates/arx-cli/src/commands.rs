use anyhow::Context;
use arx_sdk::{list_objects, validate_directory, Arx, ArxConfig, Value};
use colored::Colorize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Ls(args) => cmd_ls(args, &cli.format),
        Command::Validate(args) => cmd_validate(Arx::with_config(config), args, &cli.format),
        Command::Show(args) => cmd_show(Arx::with_config(config), args, &cli.format),
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ArxConfig> {
    match &cli.config {
        Some(path) => ArxConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(ArxConfig::default()),
    }
}

fn cmd_ls(args: LsArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let entries = list_objects(&args.dir, args.children)?;
    if let OutputFormat::Json = format {
        let rows: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "path": e.path.display().to_string(),
                    "type": e.object_type,
                    "child": e.child,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No artifacts found.");
    }
    for e in &entries {
        let path = e.path.display().to_string();
        if e.child {
            println!("  {}  {}", path.dimmed(), e.object_type.cyan());
        } else {
            println!("{}  {}", path.bold(), e.object_type.cyan());
        }
    }
    Ok(())
}

fn cmd_validate(arx: Arx, args: ValidateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let results = validate_directory(&arx, &args.dir)?;
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    if let OutputFormat::Json = format {
        let rows: Vec<serde_json::Value> = results
            .iter()
            .map(|(e, r)| {
                serde_json::json!({
                    "path": e.path.display().to_string(),
                    "type": e.object_type,
                    "error": r.as_ref().err().map(ToString::to_string),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (e, r) in &results {
            match r {
                Ok(()) => println!("{} {} ({})", "✓".green(), e.path.display(), e.object_type),
                Err(err) => println!("{} {} ({}): {}", "✗".red().bold(), e.path.display(), e.object_type, err),
            }
        }
        println!("{} checked, {} failed", results.len(), failed);
    }

    if failed > 0 {
        anyhow::bail!("{failed} artifact(s) failed validation");
    }
    Ok(())
}

fn cmd_show(arx: Arx, args: ShowArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let meta = arx_meta::read_metadata(&args.dir)
        .with_context(|| format!("reading {}", args.dir.display()))?;
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&meta.to_json())?);
        return Ok(());
    }
    let value = arx.read(&args.dir, Some(meta.clone()))?;
    println!("{} {}", meta.object_type().cyan().bold(), args.dir.display());
    if let Some(path) = meta.path() {
        println!("  File: {path}");
    }
    if let Some(checksum) = meta.checksum() {
        println!("  Checksum: {}", checksum.dimmed());
    }
    for line in describe(&value) {
        println!("  {line}");
    }
    Ok(())
}

/// Human-readable summary lines for a loaded value.
fn describe(value: &Value) -> Vec<String> {
    match value {
        Value::Nothing => vec!["nothing".into()],
        Value::Scalar(s) => vec![format!("{} scalar", s.element_type().as_str())],
        Value::Vector(v) => {
            let missing = v.data().missing_count();
            let mut line = format!("{} {} values", v.len(), v.element_type().as_str());
            if missing > 0 {
                line.push_str(&format!(", {missing} missing"));
            }
            if v.names().is_some() {
                line.push_str(", named");
            }
            vec![line]
        }
        Value::Factor(f) => vec![format!(
            "{} values, {} levels{}",
            f.len(),
            f.levels().len(),
            if f.is_ordered() { ", ordered" } else { "" }
        )],
        Value::List(l) => {
            let mut lines = vec![format!("{} entries", l.len())];
            for (i, child) in l.iter().enumerate() {
                let name = l.names().map_or_else(|| format!("[{i}]"), |n| n[i].clone());
                lines.push(format!("  {name}: {}", child.kind()));
            }
            lines
        }
        Value::Frame(df) => {
            let mut lines = vec![format!("{} rows x {} columns", df.nrows(), df.ncols())];
            for c in df.columns() {
                let kind = match &c.value {
                    Value::Vector(v) => v.element_type().as_str().to_string(),
                    other => other.kind().to_string(),
                };
                lines.push(format!("  {}: {kind}", c.name));
            }
            if df.row_names().is_some() {
                lines.push("row names present".into());
            }
            lines
        }
        Value::Object(_) => vec!["host object".into()],
    }
}
