use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use moddiff_handler::{
    printer, DescriptorRegistry, DiffHandler, HandlerConfig, InMemoryRegistry, Resource,
    ResourceDiff, ResourceKind, SchemalessRegistry, TextEntry,
};
use moddiff_types::Node;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &config, &cli.format),
        Command::Apply(args) => cmd_apply(args, &config, &cli.format),
        Command::Show(args) => cmd_show(args, &config, &cli.format),
        Command::Check(args) => cmd_check(args, &cli.format),
    }
}

fn cmd_diff(args: DiffArgs, config: &CliConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let kind = ResourceKind::from(args.kind);
    let target = load_resource(&args.target, kind)?;
    let source = load_resource(&args.source, kind)?;

    let handler = DiffHandler::schemaless();
    let Some(diff) = handler.diff_resource(&target, &source)? else {
        match format {
            OutputFormat::Json => println!("{}", json!({"changed": false})),
            OutputFormat::Text => println!("{} No changes.", "✓".green()),
        }
        return Ok(());
    };

    let value = serde_json::to_value(&diff)?;
    match &args.output {
        Some(path) => {
            write_json(path, &value, config.pretty)?;
            print_summary(&diff, path, format);
        }
        None => println!("{}", render_json(&value, config.pretty)?),
    }
    Ok(())
}

fn cmd_apply(args: ApplyArgs, config: &CliConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let diffs = args
        .diffs
        .iter()
        .map(|path| load_diff(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let Some(first) = diffs.first() else {
        bail!("no diffs given");
    };
    let target = load_resource(&args.target, first.kind())?;

    let mut patch = config.patch.clone();
    patch.strict_fields |= args.strict;
    let handler_config = HandlerConfig::with_patch(patch);
    let class = args.class.as_deref();

    let patched = match args.schema.as_ref().or(config.schema.as_ref()) {
        Some(schema) => {
            let handler = DiffHandler::with_config(load_registry(schema)?, handler_config);
            apply_diffs(&handler, target, &diffs, class)?
        }
        None => apply_diffs(
            &DiffHandler::with_config(SchemalessRegistry, handler_config),
            target,
            &diffs,
            class,
        )?,
    };

    let value = resource_to_json(&patched)?;
    match &args.output {
        Some(path) => {
            write_json(path, &value, config.pretty)?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    json!({"applied": diffs.len(), "output": path.display().to_string()})
                ),
                OutputFormat::Text => println!(
                    "{} Applied {} diff(s) to {} → {}",
                    "✓".green().bold(),
                    diffs.len().to_string().bold(),
                    args.target.display(),
                    path.display().to_string().bold()
                ),
            }
        }
        None => println!("{}", render_json(&value, config.pretty)?),
    }
    Ok(())
}

/// Apply `diffs` in order. With a declared class, object targets are patched
/// as that class instead of their own type tag.
fn apply_diffs<R: DescriptorRegistry>(
    handler: &DiffHandler<R>,
    target: Resource,
    diffs: &[ResourceDiff],
    class: Option<&str>,
) -> anyhow::Result<Resource> {
    match (class, target) {
        (Some(class), Resource::Object(mut node)) => {
            for (position, diff) in diffs.iter().enumerate() {
                let ResourceDiff::Object(d) = diff else {
                    bail!("diff {position} is a {} diff, expected object", diff.kind());
                };
                handler
                    .apply_object(&mut node, d, Some(class))
                    .with_context(|| format!("applying diff {position}"))?;
            }
            info!(class, applied = diffs.len(), "applied diff chain");
            Ok(Resource::Object(node))
        }
        (_, target) => Ok(handler.apply_chain(&target, diffs)?),
    }
}

fn cmd_show(args: ShowArgs, config: &CliConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let diff = load_diff(&args.diff)?;
    match format {
        OutputFormat::Text => println!("{}", printer::render_resource(&diff)),
        OutputFormat::Json => {
            println!("{}", render_json(&serde_json::to_value(&diff)?, config.pretty)?)
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut reports = Vec::new();
    for path in &args.diffs {
        let diff = load_diff(path)?;
        match format {
            OutputFormat::Json => reports.push(json!({
                "path": path.display().to_string(),
                "kind": diff.kind(),
                "additions": diff.additions(),
                "removals": diff.removals(),
                "changes": diff.changes(),
            })),
            OutputFormat::Text => println!(
                "{} {}: {} diff, {} added, {} removed, {} changed",
                "✓".green(),
                path.display().to_string().bold(),
                diff.kind().to_string().cyan(),
                diff.additions().to_string().green(),
                diff.removals().to_string().red(),
                diff.changes().to_string().yellow()
            ),
        }
    }
    if matches!(format, OutputFormat::Json) {
        println!("{}", Value::Array(reports));
    }
    Ok(())
}

fn print_summary(diff: &ResourceDiff, path: &Path, format: &OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "changed": true,
                "kind": diff.kind(),
                "output": path.display().to_string(),
                "additions": diff.additions(),
                "removals": diff.removals(),
                "changes": diff.changes(),
            })
        ),
        OutputFormat::Text => {
            println!(
                "{} Wrote {} diff to {}",
                "✓".green().bold(),
                diff.kind(),
                path.display().to_string().bold()
            );
            println!("  Added: {}", diff.additions().to_string().green());
            println!("  Removed: {}", diff.removals().to_string().red());
            println!("  Changed: {}", diff.changes().to_string().yellow());
        }
    }
}

// ---- File I/O ----

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn render_json(value: &Value, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

fn write_json(path: &Path, value: &Value, pretty: bool) -> anyhow::Result<()> {
    let mut text = render_json(value, pretty)?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), "wrote output");
    Ok(())
}

fn load_resource(path: &Path, kind: ResourceKind) -> anyhow::Result<Resource> {
    let value = read_json(path)?;
    let resource = match kind {
        ResourceKind::Object => Resource::Object(Node::from_json(value)),
        ResourceKind::List => match Node::from_json(value) {
            Node::Array(array) => Resource::List(array.items),
            other => bail!("{} is not a list (found {})", path.display(), other.kind()),
        },
        ResourceKind::TextTable => {
            let entries: Vec<TextEntry> = serde_json::from_value(value)
                .with_context(|| format!("{} is not a text table", path.display()))?;
            Resource::TextTable(entries)
        }
    };
    Ok(resource)
}

fn resource_to_json(resource: &Resource) -> anyhow::Result<Value> {
    Ok(match resource {
        Resource::Object(node) => node.to_json(),
        Resource::List(items) => Value::Array(items.iter().map(Node::to_json).collect()),
        Resource::TextTable(entries) => serde_json::to_value(entries)?,
    })
}

fn load_diff(path: &Path) -> anyhow::Result<ResourceDiff> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    ResourceDiff::from_json_str(&text).with_context(|| format!("decoding diff {}", path.display()))
}

fn load_registry(path: &Path) -> anyhow::Result<InMemoryRegistry> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading schema {}", path.display()))?;
    let registry = InMemoryRegistry::from_json_str(&text)
        .with_context(|| format!("loading schema {}", path.display()))?;
    debug!(path = %path.display(), classes = registry.len(), "loaded schema");
    Ok(registry)
}
