// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, bail, Context, Result};
use celeris::unstable::{builtin_type, Lexer, Source, TokenKind};
use celeris::{CheckerOptions, Env, MapActivation, NoHints, Type};

// Declarations are given as `name:type`. Parameterized types are limited to
// one level, e.g. `list(int)` or `map(string, int)`.
fn parse_decl(decl: &str) -> Result<(String, Type)> {
    let Some((name, ty)) = decl.split_once(':') else {
        bail!("invalid declaration `{decl}`. Expected name:type");
    };
    let ty = ty.trim();
    let parsed = if let Some(args) = ty.strip_suffix(')') {
        let Some((outer, args)) = args.split_once('(') else {
            bail!("invalid type `{ty}`");
        };
        let params = args
            .split(',')
            .map(|p| builtin_type(p.trim()).ok_or_else(|| anyhow!("unknown type `{p}`")))
            .collect::<Result<Vec<_>>>()?;
        match (outer.trim(), params.as_slice()) {
            ("list", [e]) => Type::list(e.clone()),
            ("map", [k, v]) => Type::map(k.clone(), v.clone()),
            ("optional_type", [t]) => Type::optional(t.clone()),
            _ => bail!("invalid type `{ty}`"),
        }
    } else {
        match builtin_type(ty) {
            Some(t) => t,
            None if ty.contains('.') => Type::object(ty),
            None => bail!("unknown type `{ty}`"),
        }
    };
    Ok((name.trim().to_string(), parsed))
}

fn read_bindings(file: &str) -> Result<MapActivation> {
    let contents =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {file}"))?;
    if file.ends_with(".json") {
        MapActivation::from_json_str(&contents)
    } else if file.ends_with(".yaml") {
        MapActivation::from_yaml_str(&contents)
    } else {
        bail!("Unsupported bindings file `{file}`. Must be json or yaml.")
    }
}

fn cel_eval(expr: &str, bindings: Option<String>, decls: &[String], cost: bool) -> Result<()> {
    let mut env = Env::standard()?.with_checker_options(CheckerOptions {
        require_bool_result: false,
        ..CheckerOptions::default()
    });
    for decl in decls {
        let (name, ty) = parse_decl(decl)?;
        env = env.with_variable(&name, ty)?;
    }

    let checked = env.compile(expr).map_err(|issues| anyhow!("{issues}"))?;
    println!("type: {}", checked.result_type());
    if cost {
        println!("cost: {}", env.estimate_cost(&checked, &NoHints));
    }

    let activation = match bindings {
        Some(file) => read_bindings(&file)?,
        None => MapActivation::new(),
    };
    let program = env.program(checked).map_err(|e| anyhow!("{e}"))?;
    let (value, _) = program.eval(&activation);
    match serde_json::to_string_pretty(&value) {
        Ok(json) => println!("eval result:\n{json}"),
        Err(_) => println!("eval result:\n{value}"),
    }

    Ok(())
}

fn cel_lex(expr: &str, verbose: bool) -> Result<()> {
    let source = Source::new("<input>".to_string(), expr.to_string());
    let mut lexer = Lexer::new(&source);

    // Read tokens until EOF.
    loop {
        let token = lexer.next_token().map_err(|e| anyhow!("{e}"))?;
        if token.0 == TokenKind::Eof {
            break;
        }

        if verbose {
            // Print each token's line and mark it with ^.
            println!("{}", token.1.message("", ""));
        }

        println!("{token:?}");
    }
    Ok(())
}

fn cel_parse(expr: &str) -> Result<()> {
    let ast = celeris::parse(expr).map_err(|issues| anyhow!("{issues}"))?;
    println!("{ast:#?}");
    println!("{}", celeris::unparse(&ast));
    Ok(())
}

#[derive(clap::Subcommand)]
enum CelerisCommand {
    /// Evaluate a CEL expression.
    Eval {
        /// Expression to evaluate.
        #[arg(long, short)]
        expr: String,

        /// Variable bindings. json or yaml.
        #[arg(long, short, value_name = "bindings.json")]
        bindings: Option<String>,

        /// Variable declarations.
        #[arg(long, short, value_name = "name:type")]
        decl: Vec<String>,

        /// Print the estimated cost.
        #[arg(long, short)]
        cost: bool,
    },

    /// Tokenize a CEL expression.
    Lex {
        /// Expression to tokenize.
        #[arg(long, short)]
        expr: String,

        /// Verbose output.
        #[arg(long, short)]
        verbose: bool,
    },

    /// Parse a CEL expression.
    Parse {
        /// Expression to parse.
        #[arg(long, short)]
        expr: String,
    },
}

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CelerisCommand,
}

fn main() -> Result<()> {
    use clap::Parser;

    // Parse and dispatch command.
    let cli = Cli::parse();
    match cli.command {
        CelerisCommand::Eval {
            expr,
            bindings,
            decl,
            cost,
        } => cel_eval(&expr, bindings, &decl, cost),
        CelerisCommand::Lex { expr, verbose } => cel_lex(&expr, verbose),
        CelerisCommand::Parse { expr } => cel_parse(&expr),
    }
}
