use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use runtime_formula::{
    Category, EditorMode, EngineConfig, FormulaFunction, FormulaMode, FunctionRegistry, Node,
    evaluate_formula, from_rich_text, is_formula_valid, load_config, resolve_formula,
    to_rich_text,
};

mod printer;

use printer::{Format, PrinterArgs};

/// A command line tool for evaluating runtime formulas and converting them to and from the
/// rich-text documents used by the formula editor.
#[derive(Debug, Parser)]
#[command(name = "runtime-formula", version, about)]
struct Cli {
    /// Path to an engine configuration file (YAML or JSON) with the timezone, fallback and
    /// static data providers.
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a formula and print its value.
    Eval {
        formula: String,

        /// Override the configured formula mode ("simple", "advanced" or "raw").
        #[arg(long)]
        mode: Option<FormulaMode>,

        /// Override the configured timezone.
        #[arg(long)]
        timezone: Option<String>,

        /// Fail on errors instead of printing the fallback value.
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        printer: PrinterArgs,
    },
    /// Check that a formula parses and only calls known functions. Exits with 1 when invalid.
    Validate { formula: String },
    /// Render a formula as a rich-text document.
    ToRichText {
        formula: String,

        /// Editor mode, "simple" or "advanced". Defaults to the configured mode.
        #[arg(long)]
        mode: Option<EditorMode>,

        #[command(flatten)]
        printer: PrinterArgs,
    },
    /// Read a rich-text JSON document from a file, or stdin, and print the formula.
    FromRichText {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Editor mode, "simple" or "advanced". Defaults to the configured mode.
        #[arg(long)]
        mode: Option<EditorMode>,
    },
    /// List the available functions and operators.
    Functions {
        /// Only list functions of this category.
        #[arg(long)]
        category: Option<Category>,

        #[command(flatten)]
        printer: PrinterArgs,
    },
}

/// One catalog entry as printed by `functions`.
#[derive(Debug, Serialize, Tabled)]
struct FunctionRow {
    name: String,
    category: String,
    kind: String,
    #[tabled(rename = "arguments")]
    signature: String,
    description: String,
    #[tabled(skip)]
    examples: Vec<ExampleRow>,
}

#[derive(Debug, Serialize)]
struct ExampleRow {
    formula: String,
    result: serde_json::Value,
}

impl FunctionRow {
    fn new(function: &dyn FormulaFunction) -> Self {
        let signature = match function.args() {
            None => "...".to_string(),
            Some(args) => args
                .iter()
                .map(|arg| {
                    if arg.optional {
                        format!("{}?", arg.kind)
                    } else {
                        arg.kind.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
        };
        let name = match function.operator_symbol() {
            Some(symbol) => format!("{} ({symbol})", function.name()),
            None => function.name().to_string(),
        };
        let examples = function
            .examples()
            .iter()
            .map(|example| ExampleRow {
                formula: example.formula.to_string(),
                result: serde_json::from_str(example.result)
                    .unwrap_or_else(|_| serde_json::Value::String(example.result.to_string())),
            })
            .collect();

        Self {
            name,
            category: function.category().to_string(),
            kind: function.kind().to_string(),
            signature,
            description: function.description().to_string(),
            examples,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            load_config(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    log::debug!("using configuration {config:?}");
    let registry = FunctionRegistry::with_builtins();
    let mut writer = std::io::stdout();

    match cli.command {
        Command::Eval {
            formula,
            mode,
            timezone,
            strict,
            printer,
        } => {
            let mut config = config;
            if let Some(mode) = mode {
                config.mode = mode;
            }
            if timezone.is_some() {
                config.timezone = timezone;
            }
            let context = config.clone().into_context()?;

            let value = if strict && config.mode != FormulaMode::Raw {
                evaluate_formula(&formula, &registry, &context)
                    .with_context(|| format!("evaluating `{formula}`"))?
            } else {
                resolve_formula(&formula, &registry, &context, &config)
            };

            match printer.output {
                Format::Plain => printer.output.print_plain([value], &mut writer),
                Format::Json | Format::Binary => {
                    printer.output.print_structured(value, &mut writer)
                }
            }
        }
        Command::Validate { formula } => {
            if is_formula_valid(&formula, &registry) {
                println!("valid");
                Ok(())
            } else {
                println!("invalid");
                std::process::exit(1);
            }
        }
        Command::ToRichText {
            formula,
            mode,
            printer,
        } => {
            let mode = editor_mode(mode, &config);
            let doc = to_rich_text(&formula, &registry, mode)
                .with_context(|| format!("converting `{formula}`"))?;

            match printer.output {
                Format::Plain => {
                    let pretty = serde_json::to_string_pretty(&doc)?;
                    printer.output.print_plain([pretty], &mut writer)
                }
                Format::Json | Format::Binary => printer.output.print_structured(doc, &mut writer),
            }
        }
        Command::FromRichText { file, mode } => {
            let mode = editor_mode(mode, &config);
            let json = match &file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("reading stdin")?;
                    buffer
                }
            };
            let doc: Node = serde_json::from_str(&json).context("parsing rich-text document")?;
            let formula = from_rich_text(&doc, &registry, mode)?;
            println!("{formula}");
            Ok(())
        }
        Command::Functions { category, printer } => {
            let rows = registry
                .get_all()
                .filter(|function| category.is_none_or(|category| function.category() == category))
                .map(FunctionRow::new)
                .collect();
            printer.output.print_rows(rows, &mut writer)
        }
    }
}

/// The requested editor mode, else the configured one. Raw formulas use the simple editor.
fn editor_mode(requested: Option<EditorMode>, config: &EngineConfig) -> EditorMode {
    requested
        .or_else(|| config.mode.editor_mode())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_rows_describe_signatures() {
        let registry = FunctionRegistry::with_builtins();

        let round = FunctionRow::new(registry.get("round").unwrap());
        assert_eq!(round.signature, "number, number?");
        assert_eq!(round.category, "number");

        let concat = FunctionRow::new(registry.get("concat").unwrap());
        assert_eq!(concat.signature, "...");

        let add = FunctionRow::new(registry.get("add").unwrap());
        assert_eq!(add.name, "add (+)");
        assert_eq!(add.kind, "operator");
        assert_eq!(add.examples[0].result, serde_json::json!(5));
    }

    #[test]
    fn editor_mode_prefers_the_flag() {
        let config = EngineConfig {
            mode: FormulaMode::Advanced,
            ..Default::default()
        };
        assert_eq!(editor_mode(None, &config), EditorMode::Advanced);
        assert_eq!(
            editor_mode(Some(EditorMode::Simple), &config),
            EditorMode::Simple
        );

        let raw = EngineConfig {
            mode: FormulaMode::Raw,
            ..Default::default()
        };
        assert_eq!(editor_mode(None, &raw), EditorMode::Simple);
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["runtime-formula", "eval", "2 + 3", "-o", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Eval { ref formula, printer: PrinterArgs { output: Format::Json }, .. }
                if formula == "2 + 3"
        ));

        let cli =
            Cli::try_parse_from(["runtime-formula", "functions", "--category", "date"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Functions {
                category: Some(Category::Date),
                ..
            }
        ));
    }
}
