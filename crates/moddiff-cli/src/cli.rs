use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use moddiff_handler::ResourceKind;

#[derive(Parser)]
#[command(
    name = "moddiff",
    about = "moddiff: structural diff and patch for mod bundles",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ./moddiff.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    Object,
    List,
    TextTable,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Object => ResourceKind::Object,
            KindArg::List => ResourceKind::List,
            KindArg::TextTable => ResourceKind::TextTable,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the diff that turns TARGET into SOURCE
    Diff(DiffArgs),
    /// Apply one or more diffs to TARGET, in order
    Apply(ApplyArgs),
    /// Render a stored diff as indented paths
    Show(ShowArgs),
    /// Decode stored diffs and report what they change
    Check(CheckArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// Baseline resource
    pub target: PathBuf,
    /// Modified resource
    pub source: PathBuf,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "object")]
    pub kind: KindArg,
}

#[derive(Args)]
pub struct ApplyArgs {
    pub target: PathBuf,
    #[arg(required = true)]
    pub diffs: Vec<PathBuf>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Class schema (JSON); overrides the config file
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Declared class of an object target
    #[arg(long)]
    pub class: Option<String>,
    /// Fail on fields the schema does not declare
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub diff: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(required = true)]
    pub diffs: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_diff() {
        let cli =
            Cli::try_parse_from(["moddiff", "diff", "a.json", "b.json", "-o", "d.json"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.target, PathBuf::from("a.json"));
            assert_eq!(args.source, PathBuf::from("b.json"));
            assert_eq!(args.output, Some(PathBuf::from("d.json")));
            assert_eq!(args.kind, KindArg::Object);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff_kind() {
        let cli =
            Cli::try_parse_from(["moddiff", "diff", "--kind", "text-table", "a", "b"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.kind, KindArg::TextTable);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_apply_chain() {
        let cli = Cli::try_parse_from([
            "moddiff", "apply", "base.json", "one.json", "two.json",
            "--schema", "classes.json", "--class", "Unit", "--strict",
        ])
        .unwrap();
        if let Command::Apply(args) = cli.command {
            assert_eq!(args.diffs.len(), 2);
            assert_eq!(args.schema, Some(PathBuf::from("classes.json")));
            assert_eq!(args.class, Some("Unit".into()));
            assert!(args.strict);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn apply_requires_a_diff() {
        assert!(Cli::try_parse_from(["moddiff", "apply", "base.json"]).is_err());
    }

    #[test]
    fn parse_show() {
        let cli = Cli::try_parse_from(["moddiff", "show", "d.json"]).unwrap();
        assert!(matches!(cli.command, Command::Show(_)));
    }

    #[test]
    fn parse_check() {
        let cli = Cli::try_parse_from(["moddiff", "check", "a.json", "b.json"]).unwrap();
        if let Command::Check(args) = cli.command {
            assert_eq!(args.diffs.len(), 2);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "moddiff", "--verbose", "--config", "m.toml", "--format", "json", "show", "d.json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("m.toml")));
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
