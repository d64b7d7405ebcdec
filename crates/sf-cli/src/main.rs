//! SolidForge command line entry point

use std::path::PathBuf;
use std::process::ExitCode;

use sf_cad::{
    BUILTIN_NAMES, ConfigError, ExportError, KernelConfig, LayeredKernel, Script, ScriptError,
    ScriptReport, ScriptRunner, builtin, save_stl,
};

const USAGE: &str = "\
Usage:
  sf list                          List built-in scripts
  sf run <script> [options]        Run a built-in script or a .ron/.json script file
      --stl <path>                 Write the resulting bodies as binary STL
      --config <path>              Load kernel settings from a RON file
  sf dump <builtin>                Print a built-in script as RON";

/// CLI errors
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}\n\n{usage}", usage = USAGE)]
    Usage(String),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    List,
    Run {
        script: String,
        stl: Option<PathBuf>,
        config: Option<PathBuf>,
    },
    Dump {
        name: String,
    },
    Help,
}

fn parse_args(args: &[String]) -> Result<Command, CliError> {
    let Some(command) = args.first() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "list" => Ok(Command::List),
        "help" | "--help" | "-h" => Ok(Command::Help),
        "dump" => args
            .get(1)
            .map(|name| Command::Dump { name: name.clone() })
            .ok_or_else(|| CliError::Usage("dump needs a script name".into())),
        "run" => {
            let mut script = None;
            let mut stl = None;
            let mut config = None;
            let mut i = 1;
            while i < args.len() {
                match args[i].as_str() {
                    "--stl" | "--config" => {
                        let value = args.get(i + 1).ok_or_else(|| {
                            CliError::Usage(format!("{} needs a path", args[i]))
                        })?;
                        if args[i] == "--stl" {
                            stl = Some(PathBuf::from(value));
                        } else {
                            config = Some(PathBuf::from(value));
                        }
                        i += 2;
                        continue;
                    }
                    flag if flag.starts_with("--") => {
                        return Err(CliError::Usage(format!("unknown option {flag}")));
                    }
                    value if script.is_none() => script = Some(value.to_string()),
                    value => {
                        return Err(CliError::Usage(format!("unexpected argument {value}")));
                    }
                }
                i += 1;
            }
            let script = script.ok_or_else(|| CliError::Usage("run needs a script".into()))?;
            Ok(Command::Run {
                script,
                stl,
                config,
            })
        }
        other => Err(CliError::Usage(format!("unknown command {other}"))),
    }
}

/// Resolve a built-in name or a script file
fn load_script(target: &str) -> Result<Script, ScriptError> {
    match builtin(target) {
        Some(script) => Ok(script),
        None if std::path::Path::new(target).exists() => Script::load(target),
        None => Err(ScriptError::UnknownScript(target.to_string())),
    }
}

fn print_report(report: &ScriptReport) {
    println!("{}", report.message);
    for body in &report.bodies {
        let volume = body.volume();
        match body.mesh.bounds() {
            Some((min, max)) => println!(
                "  {}: volume {:.2} mm^3, {} triangles, bounds [{:.2}, {:.2}, {:.2}] - [{:.2}, {:.2}, {:.2}]",
                body.name,
                volume,
                body.mesh.triangle_count(),
                min.x,
                min.y,
                min.z,
                max.x,
                max.y,
                max.z
            ),
            None => println!("  {}: empty", body.name),
        }
    }
}

fn execute(command: Command) -> Result<(), CliError> {
    match command {
        Command::Help => println!("{USAGE}"),
        Command::List => {
            for name in BUILTIN_NAMES {
                let description = builtin(name).map(|s| s.description).unwrap_or_default();
                println!("{name:<32} {description}");
            }
        }
        Command::Dump { name } => {
            let script = builtin(&name).ok_or(ScriptError::UnknownScript(name))?;
            println!("{}", script.to_ron()?);
        }
        Command::Run {
            script,
            stl,
            config,
        } => {
            let config = match config {
                Some(path) => KernelConfig::load(path)?,
                None => KernelConfig::default(),
            };
            let kernel = LayeredKernel::with_config(config);
            let script = load_script(&script)?;
            let report = ScriptRunner::new(&kernel).run(&script)?;
            print_report(&report);

            if let Some(path) = stl {
                save_stl(&report.combined_mesh(), &path)?;
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sf_cli=info,sf_cad=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args).and_then(execute) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Failed:\n{e}");
            ExitCode::FAILURE
        }
    }
}
