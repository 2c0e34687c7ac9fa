//! `luacv`: run a Lua script with the `luacv` module loaded.
//!
//! ```text
//! luacv [--config FILE] [-v...] SCRIPT [ARGS...]
//! luacv -e 'print(luacv._VERSION)'
//! ```
//!
//! Windows are headless. Key presses for `WaitKey` can be scripted with
//! `--key`.

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{ArgAction, Parser};
use luacv::{Config, ConfigError, Options};
use luacv_highgui::HeadlessWindows;
use mlua::{Lua, Table, Variadic};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "luacv", version, about = "Run Lua scripts with the luacv bindings")]
struct Cli {
    /// JSON settings file; defaults to the path in $LUACV_CONFIG.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run CHUNK instead of a script file.
    #[arg(short = 'e', long = "execute", value_name = "CHUNK", conflicts_with = "script")]
    execute: Option<String>,

    /// More logging (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Make `WaitKey(delay)` sleep when no key is queued.
    #[arg(long)]
    real_delays: bool,

    /// Key code returned by the next `WaitKey`; repeat for more keys.
    #[arg(long = "key", value_name = "CODE")]
    keys: Vec<i32>,

    /// Lua script to run.
    #[arg(required_unless_present = "execute")]
    script: Option<PathBuf>,

    /// Arguments for the script, visible as `arg` and `...`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot read {path}: {source}")]
    Script {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error("{0}")]
    Lua(#[from] mlua::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Lua(_) => 1,
            _ => 2,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::from_json_file(path),
        None => Config::from_env(),
    }
}

fn init_logging(verbose: u8, config: &Config) -> Result<(), CliError> {
    let quiet = config.level_filter()?.unwrap_or(log::LevelFilter::Warn);
    let level = luacv_core::verbosity_level(verbose, quiet);
    #[cfg(feature = "tracing")]
    luacv_core::init_tracing(level);
    #[cfg(not(feature = "tracing"))]
    luacv_core::init_stderr_logger(level)?;
    Ok(())
}

/// Load the script source. A leading `#!` line is blanked so line numbers
/// still match the file.
fn read_script(path: &PathBuf) -> Result<String, CliError> {
    let source = std::fs::read_to_string(path).map_err(|source| CliError::Script {
        path: path.clone(),
        source,
    })?;
    if source.starts_with("#!") {
        let rest = source.find('\n').map_or("", |end| &source[end..]);
        return Ok(rest.to_owned());
    }
    Ok(source)
}

fn set_args(lua: &Lua, script: &str, args: &[String]) -> mlua::Result<()> {
    let table = lua.create_table()?;
    table.raw_set(0, script)?;
    for (k, value) in args.iter().enumerate() {
        table.raw_set(k + 1, value.as_str())?;
    }
    lua.globals().set("arg", table)
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_ref())?;
    init_logging(cli.verbose, &config)?;

    let mut windows = HeadlessWindows::new().with_real_delays(cli.real_delays);
    for key in &cli.keys {
        windows.push_key(*key);
    }

    let lua = Lua::new();
    let options = Options::new(config).with_windows(Rc::new(RefCell::new(windows)));
    let module = luacv::open_with(&lua, options)?;
    lua.globals().set("luacv", module.clone())?;
    let loaded: Table = lua.globals().get::<_, Table>("package")?.get("loaded")?;
    loaded.set("luacv", module)?;

    // clap guarantees one of the two.
    let (name, source) = match (&cli.execute, &cli.script) {
        (Some(chunk), _) => ("=(command line)".to_owned(), chunk.clone()),
        (None, Some(path)) => (format!("@{}", path.display()), read_script(path)?),
        (None, None) => return Ok(()),
    };
    let script = cli
        .script
        .as_ref()
        .map_or_else(|| "luacv".to_owned(), |p| p.display().to_string());
    set_args(&lua, &script, &cli.args)?;

    log::debug!("running {name}");
    lua.load(source)
        .set_name(name)
        .call::<_, ()>(Variadic::from_iter(cli.args))?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("luacv: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
