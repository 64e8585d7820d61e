use clap::{Parser as ClapParser, Subcommand};
use policy_expr::Registry;
use policy_expr::cli::{self, CheckOptions, CheckResult, CliError};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "policy-expr")]
#[command(about = "Evaluate policy expressions against a JSON context")]
#[command(version)]
struct Cli {
    /// Log evaluation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and evaluate an expression
    Check {
        /// The expression to evaluate
        expression: String,

        /// JSON object of named values (reads from stdin if not provided)
        #[arg(short, long)]
        context: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,

        /// Treat the expression as a policy expecting this result
        #[arg(long)]
        expect: Option<bool>,
    },

    /// Print the tokens of an expression
    Tokens {
        expression: String,
    },

    /// Print the parsed tree of an expression
    Tree {
        expression: String,
    },

    /// List the operators and their binding powers
    Operators,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Check {
            expression,
            context,
            pretty,
            syntax_only,
            expect,
        } => run_check(expression, context, pretty, syntax_only, expect),
        Commands::Tokens { expression } => {
            print!("{}", cli::render_tokens(&expression));
            Ok(())
        }
        Commands::Tree { expression } => cli::render_tree(&expression).map(|tree| print!("{}", tree)),
        Commands::Operators => {
            print!("{}", cli::describe_operators(Registry::standard()));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(
    expression: String,
    context: Option<String>,
    pretty: bool,
    syntax_only: bool,
    expect: Option<bool>,
) -> Result<(), CliError> {
    let context = match context {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        expression,
        context,
        syntax_only,
        expect,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
        CheckResult::Policy { applies } => {
            if applies {
                println!("Policy applies");
            } else {
                println!("Policy does not apply");
                std::process::exit(2);
            }
        }
    }
    Ok(())
}
