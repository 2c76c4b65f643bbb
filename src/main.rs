use app_bootstrap::config::{self, DEFAULT_ENV_FILE, Settings, SettingsLoader};
use app_bootstrap::logging;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

const LOG_TARGET: &str = "env_check";

struct Args {
    project_root: PathBuf,
    env_file: Option<PathBuf>,
    print: bool,
}

impl Args {
    fn env_file(&self) -> PathBuf {
        self.env_file
            .clone()
            .unwrap_or_else(|| self.project_root.join(DEFAULT_ENV_FILE))
    }
}

fn parse_args(argv: impl IntoIterator<Item = String>) -> Args {
    let mut args = Args {
        project_root: PathBuf::from("."),
        env_file: None,
        print: false,
    };
    for arg in argv {
        if let Some(path) = arg.strip_prefix("--env-file=") {
            args.env_file = Some(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--project-root=") {
            args.project_root = PathBuf::from(path);
        } else if arg == "--print" {
            args.print = true;
        }
    }
    args
}

fn main() -> ExitCode {
    let args = parse_args(env::args().skip(1));
    let env_file = args.env_file();

    let settings = match SettingsLoader::new().env_file(&env_file).load() {
        Ok(settings) => config::install(settings),
        Err(e) => {
            eprintln!("Failed to load settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::configure(&settings) {
        eprintln!("Failed to configure logging: {}", e);
        return ExitCode::FAILURE;
    }

    if args.print {
        match serde_json::to_string_pretty(&*settings) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(target: LOG_TARGET, error = %e, "Could not print settings"),
        }
    }

    if check_env(&settings, &env_file) {
        ExitCode::SUCCESS
    } else {
        error!(target: LOG_TARGET, "Configuration check failed - exiting");
        ExitCode::FAILURE
    }
}

/// Log the resolved configuration and verify the env file and log directory.
fn check_env(settings: &Settings, env_file: &Path) -> bool {
    info!(target: LOG_TARGET, "Starting .env configuration check");

    info!(
        target: LOG_TARGET,
        app_name = %settings.app.app_name,
        dev_mode = settings.app.dev_mode,
        environment = %settings.app.environment,
        log_level = %settings.log.log_level,
        log_dir = %settings.log.log_dir.display(),
        log_file = %settings.log.log_file,
        "Current configuration"
    );

    if env_file.is_file() {
        info!(target: LOG_TARGET, env_file = %env_file.display(), "Environment file found");
    } else {
        error!(
            target: LOG_TARGET,
            env_file = %env_file.display(),
            detail = ".env file is required!",
            instructions = "Create one from .env.example: cp .env.example .env",
            "Environment file not found"
        );
        return false;
    }

    let log_dir = &settings.log.log_dir;
    if log_dir.is_dir() {
        info!(target: LOG_TARGET, log_dir = %log_dir.display(), "Log directory exists");
    } else {
        warn!(
            target: LOG_TARGET,
            log_dir = %log_dir.display(),
            detail = "It will be created when first log is written",
            "Log directory not found"
        );
    }

    info!(target: LOG_TARGET, "Configuration check completed successfully");
    true
}
