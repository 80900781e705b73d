use clap::Parser;
use clap::Subcommand;
use expr_calc::{Grammar, Lexer, LexerMode, Options, infix, rpn};

#[derive(Parser, Debug)]
#[command(version, about = "Evaluate arithmetic expressions", long_about = None)]
struct Args {
    /// Fail as soon as the lexer meets an invalid token
    #[arg(long, global = true)]
    strict: bool,

    /// Deepest parenthesis/exponent nesting accepted by the infix evaluator
    #[arg(long, global = true, default_value_t = expr_calc::config::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate an infix expression, e.g. "2 ** (3 + 1)"
    Infix { expression: String },
    /// Evaluate a postfix expression, e.g. "2 3 + 4 *"
    Rpn { expression: String },
    /// Print the tokens of an expression
    Tokenize {
        /// Use the postfix grammar
        #[arg(long)]
        rpn: bool,
        expression: String,
    },
}

fn main() -> miette::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mode = if args.strict {
        LexerMode::Strict
    } else {
        LexerMode::Tolerant
    };
    let options = Options::default()
        .with_mode(mode)
        .with_max_depth(args.max_depth);

    let result = match &args.command {
        Commands::Infix { expression } => infix::evaluate_with(expression, &options),
        Commands::Rpn { expression } => rpn::evaluate_with(expression, &options),
        Commands::Tokenize {
            rpn: postfix,
            expression,
        } => {
            let grammar = if *postfix { Grammar::Rpn } else { Grammar::Infix };
            for token in Lexer::with_mode(expression, grammar, mode) {
                match token {
                    Ok(token) => println!("{token}"),
                    Err(e) => {
                        eprintln!("{:?}", miette::Report::new(e));
                        std::process::exit(65);
                    }
                }
            }
            println!("EOF");
            return Ok(());
        }
    };

    match result {
        Ok(value) => {
            println!("{value}");
            Ok(())
        }
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(65);
        }
    }
}
