//! Process launch description and command resolution.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use portable_pty::CommandBuilder;

use super::env::EnvironmentBlock;
use crate::error::PtyError;
use crate::Result;

/// Everything needed to start the child process of a session.
///
/// The command line is opaque: it is never split or re-quoted here. It is
/// handed to a command interpreter as a single argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Executable to run. When a command line is also given, this program
    /// interprets it in place of the backend's default interpreter.
    pub app_name: Option<String>,
    /// Command line, passed through verbatim.
    pub command_line: Option<String>,
    /// Working directory; the caller's current directory when absent.
    pub working_dir: Option<PathBuf>,
    /// Complete environment of the child; inherited when absent.
    pub environment: Option<EnvironmentBlock>,
}

impl LaunchSpec {
    /// Launch the given command line through the default interpreter.
    pub fn command_line(line: impl Into<String>) -> Self {
        Self {
            command_line: Some(line.into()),
            ..Default::default()
        }
    }

    /// Launch an application directly, without arguments.
    pub fn app(app_name: impl Into<String>) -> Self {
        Self {
            app_name: Some(app_name.into()),
            ..Default::default()
        }
    }

    /// Set the application name.
    pub fn with_app(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Replace the inherited environment with an explicit block.
    pub fn environment(mut self, env: EnvironmentBlock) -> Self {
        self.environment = Some(env);
        self
    }

    fn effective_command_line(&self) -> Option<&str> {
        self.command_line.as_deref().filter(|line| !line.is_empty())
    }

    fn effective_app_name(&self) -> Option<&str> {
        self.app_name.as_deref().filter(|app| !app.is_empty())
    }

    /// Whether the spec names anything to execute.
    pub fn has_executable(&self) -> bool {
        self.effective_command_line().is_some() || self.effective_app_name().is_some()
    }
}

/// A program that runs a command line passed as one argument after a flag,
/// e.g. `/bin/sh -c` or `cmd.exe /c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: String,
    pub flag: String,
}

impl Interpreter {
    pub fn new(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }

    /// POSIX shell interpreter (`<program> -c`).
    pub fn posix(program: impl Into<String>) -> Self {
        Self::new(program, "-c")
    }

    /// Windows command processor style interpreter (`<program> /c`).
    pub fn windows(program: impl Into<String>) -> Self {
        Self::new(program, "/c")
    }
}

/// Translate a [`LaunchSpec`] into the command handed to the PTY slave.
///
/// `invalid_param_code` is the OS code reported when nothing is executable.
pub(crate) fn build_command(
    spec: &LaunchSpec,
    interpreter: &Interpreter,
    invalid_param_code: i32,
) -> Result<CommandBuilder> {
    let mut cmd = match (spec.effective_app_name(), spec.effective_command_line()) {
        (Some(app), Some(line)) => {
            let mut c = CommandBuilder::new(app);
            c.arg(&interpreter.flag);
            c.arg(line);
            c
        }
        (Some(app), None) => CommandBuilder::new(app),
        (None, Some(line)) => {
            let mut c = CommandBuilder::new(&interpreter.program);
            c.arg(&interpreter.flag);
            c.arg(line);
            c
        }
        (None, None) => {
            return Err(PtyError::launch(
                invalid_param_code,
                "no application name or command line specified",
            ))
        }
    };

    let cwd = match &spec.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    check_working_dir(&cwd)?;

    let program = spec.effective_app_name().unwrap_or(&interpreter.program);
    check_program(program, &cwd, spec.environment.as_ref())?;
    cmd.cwd(cwd);

    if let Some(env) = &spec.environment {
        cmd.env_clear();
        for (key, value) in env.iter() {
            cmd.env(key, value);
        }
    }

    Ok(cmd)
}

fn check_working_dir(dir: &Path) -> Result<()> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PtyError::launch(
            not_a_directory_code(),
            format!("working directory {} is not a directory", dir.display()),
        )),
        Err(e) => Err(PtyError::launch(
            e.raw_os_error().unwrap_or(-1),
            format!("working directory {}: {e}", dir.display()),
        )),
    }
}

/// Fail with the OS code process creation would report when `program`
/// is missing or not executable.
///
/// Bare names are looked up on the child's `PATH`. Without a `PATH` the
/// lookup is left to process creation.
fn check_program(program: &str, cwd: &Path, env: Option<&EnvironmentBlock>) -> Result<()> {
    let path = Path::new(program);
    if path.is_absolute() || path.components().count() > 1 {
        return check_candidates(&cwd.join(path)).map_err(|code| launch_failure(code, program));
    }

    let search = match env {
        Some(env) => env.get("PATH").map(OsString::from),
        None => std::env::var_os("PATH"),
    };
    let Some(search) = search else {
        return Ok(());
    };

    let mut code = not_found_code();
    for dir in std::env::split_paths(&search) {
        match check_candidates(&cwd.join(dir).join(path)) {
            Ok(()) => return Ok(()),
            Err(c) if c == permission_denied_code() => code = c,
            Err(_) => {}
        }
    }
    Err(launch_failure(code, program))
}

fn launch_failure(code: i32, program: &str) -> PtyError {
    PtyError::launch(
        code,
        format!("{program}: {}", io::Error::from_raw_os_error(code)),
    )
}

/// First candidate that exists and can be executed, else the code of the
/// first failure.
fn check_candidates(path: &Path) -> std::result::Result<(), i32> {
    let mut first = None;
    for candidate in candidates(path) {
        match check_candidate(&candidate) {
            Ok(()) => return Ok(()),
            Err(code) => {
                first.get_or_insert(code);
            }
        }
    }
    Err(first.unwrap_or_else(not_found_code))
}

#[cfg(unix)]
fn candidates(path: &Path) -> Vec<PathBuf> {
    vec![path.to_path_buf()]
}

#[cfg(unix)]
fn check_candidate(path: &Path) -> std::result::Result<(), i32> {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.permissions().mode() & 0o111 != 0 => Ok(()),
        Ok(_) => Err(permission_denied_code()),
        Err(e) => Err(e.raw_os_error().unwrap_or_else(not_found_code)),
    }
}

#[cfg(unix)]
fn not_a_directory_code() -> i32 {
    libc::ENOTDIR
}

#[cfg(unix)]
fn not_found_code() -> i32 {
    libc::ENOENT
}

#[cfg(unix)]
fn permission_denied_code() -> i32 {
    libc::EACCES
}

// Names without an extension also match with each `PATHEXT` suffix.
#[cfg(windows)]
fn candidates(path: &Path) -> Vec<PathBuf> {
    let mut out = vec![path.to_path_buf()];
    if path.extension().is_none() {
        let exts = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".into());
        for ext in exts.split(';').filter(|ext| !ext.is_empty()) {
            let mut name = path.as_os_str().to_owned();
            name.push(ext);
            out.push(PathBuf::from(name));
        }
    }
    out
}

#[cfg(windows)]
fn check_candidate(path: &Path) -> std::result::Result<(), i32> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(permission_denied_code()),
        Err(e) => Err(e.raw_os_error().unwrap_or_else(not_found_code)),
    }
}

// ERROR_DIRECTORY
#[cfg(windows)]
fn not_a_directory_code() -> i32 {
    267
}

// ERROR_FILE_NOT_FOUND
#[cfg(windows)]
fn not_found_code() -> i32 {
    2
}

// ERROR_ACCESS_DENIED
#[cfg(windows)]
fn permission_denied_code() -> i32 {
    5
}
