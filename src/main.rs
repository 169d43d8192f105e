use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use difflint::{Checker, DiffLint};

#[derive(Parser)]
#[command(name = "difflint")]
#[command(about = "Filter static code analyser and style checker output to a git diff")]
#[command(
    after_help = "Note: if no target revision is given, the diff is taken against the working tree."
)]
struct Cli {
    /// Base revision or name of the base branch
    #[arg(required_unless_present = "completions")]
    base: Option<String>,

    /// Target revision or name of the target branch (default: working tree)
    target: Option<String>,

    /// Don't show rule names with each issue description
    #[arg(long)]
    norules: bool,

    /// File extensions that participate in filtering
    #[arg(long, value_name = "EXT", value_delimiter = ',', default_value = "js")]
    types: Vec<String>,

    /// Project root containing the git repository and the checkers
    #[arg(long, value_name = "PATH", default_value = ".")]
    repo: PathBuf,

    /// Path to the jshint executable
    #[arg(long, value_name = "PATH")]
    jshint_bin: Option<String>,

    /// Path to the jscs executable
    #[arg(long, value_name = "PATH")]
    jscs_bin: Option<String>,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "difflint", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    let Some(base) = cli.base else {
        // clap enforces base unless --completions was given, handled above.
        return ExitCode::FAILURE;
    };

    let lint = DiffLint::new(&cli.repo);
    let changed = match lint.changed_lines(&base, cli.target.as_deref(), &cli.types) {
        Ok(changed) => changed,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut jshint = Checker::jshint();
    if let Some(binary) = cli.jshint_bin {
        jshint = jshint.with_binary(binary);
    }
    let mut jscs = Checker::jscs();
    if let Some(binary) = cli.jscs_bin {
        jscs = jscs.with_binary(binary);
    }

    // A checker that cannot be launched fails its own section only; the
    // other section is still attempted.
    let mut failed = false;
    for checker in [jshint, jscs] {
        match lint.check(&checker, &changed, !cli.norules) {
            Ok(report) => println!("{report}\n"),
            Err(err) => {
                eprintln!("Error: {err}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
