//! Runs embedded `PostgreSQL` lifecycle steps on behalf of a root test
//! runner.
//!
//! ```text
//! pg_worker <setup|start|stop> <payload.json>
//! ```
//!
//! `initdb` and `postgres` refuse to run as root, so when started with root
//! privileges the worker switches to the `nobody` account before touching
//! the cluster. The payload is the `WorkerPayload` JSON written by
//! `pg_embedded_setup_unpriv`.

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(unix)]
fn main() -> Result<(), BoxError> {
    unix::run(std::env::args_os()).map_err(Into::into)
}

#[cfg(not(unix))]
fn main() -> Result<(), BoxError> {
    Err("pg_worker only runs on Unix platforms".into())
}

#[cfg(unix)]
mod unix {
    use camino::{Utf8Path, Utf8PathBuf};
    use nix::unistd::{Uid, User, initgroups, setgid, setuid};
    use pg_embedded_setup_unpriv::ambient_dir_and_path;
    use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
    use postgresql_embedded::{PostgreSQL, Status};
    use std::env;
    use std::ffi::{CString, OsString};
    use std::io::Read;
    use thiserror::Error;

    const UNPRIVILEGED_USER: &str = "nobody";

    /// Failures reported by the worker.
    #[derive(Debug, Error)]
    pub(crate) enum WorkerFailure {
        #[error("invalid arguments: {0}")]
        Usage(String),
        #[error("failed to read payload {path}: {message}")]
        PayloadRead { path: Utf8PathBuf, message: String },
        #[error("failed to parse payload: {0}")]
        PayloadParse(#[source] serde_json::Error),
        #[error("invalid cluster settings: {0}")]
        Settings(String),
        #[error("failed to switch to user {UNPRIVILEGED_USER}: {0}")]
        Privileges(String),
        #[error("failed to build async runtime: {0}")]
        Runtime(#[source] std::io::Error),
        #[error("postgres {operation} failed: {message}")]
        Lifecycle {
            operation: &'static str,
            message: String,
        },
    }

    /// Lifecycle step requested by the caller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Step {
        Setup,
        Start,
        Stop,
    }

    impl Step {
        const fn name(self) -> &'static str {
            match self {
                Self::Setup => "setup",
                Self::Start => "start",
                Self::Stop => "stop",
            }
        }
    }

    impl TryFrom<&str> for Step {
        type Error = WorkerFailure;

        fn try_from(value: &str) -> Result<Self, Self::Error> {
            match value {
                "setup" => Ok(Self::Setup),
                "start" => Ok(Self::Start),
                "stop" => Ok(Self::Stop),
                other => Err(WorkerFailure::Usage(format!(
                    "unknown step '{other}', expected setup, start or stop"
                ))),
            }
        }
    }

    pub(crate) fn run(args: impl Iterator<Item = OsString>) -> Result<(), WorkerFailure> {
        let (step, payload_path) = parse_args(args)?;
        let payload = read_payload(&payload_path)?;
        become_unprivileged()?;
        let settings = payload
            .settings
            .into_settings()
            .map_err(|err| WorkerFailure::Settings(err.to_string()))?;
        apply_environment(&payload.environment);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(WorkerFailure::Runtime)?;
        runtime.block_on(drive(PostgreSQL::new(settings), step))
    }

    pub(crate) fn parse_args(
        mut args: impl Iterator<Item = OsString>,
    ) -> Result<(Step, Utf8PathBuf), WorkerFailure> {
        let _program = args.next();
        let mut utf8 = args.map(|arg| {
            arg.into_string()
                .map(Utf8PathBuf::from)
                .map_err(|_| WorkerFailure::Usage("arguments must be valid UTF-8".to_owned()))
        });
        let step = utf8
            .next()
            .ok_or_else(|| WorkerFailure::Usage("missing step".to_owned()))??;
        let payload_path = utf8
            .next()
            .ok_or_else(|| WorkerFailure::Usage("missing payload path".to_owned()))??;
        if let Some(extra) = utf8.next() {
            return Err(WorkerFailure::Usage(format!(
                "unexpected argument: {}",
                extra?.as_str()
            )));
        }
        Ok((Step::try_from(step.as_str())?, payload_path))
    }

    fn read_payload(path: &Utf8Path) -> Result<WorkerPayload, WorkerFailure> {
        let read_failure = |message: String| WorkerFailure::PayloadRead {
            path: path.to_path_buf(),
            message,
        };
        let (dir, relative) = ambient_dir_and_path(path).map_err(|err| read_failure(err.to_string()))?;
        let mut file = dir
            .open(relative.as_std_path())
            .map_err(|err| read_failure(err.to_string()))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|err| read_failure(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(WorkerFailure::PayloadParse)
    }

    fn become_unprivileged() -> Result<(), WorkerFailure> {
        if !Uid::effective().is_root() {
            return Ok(());
        }
        let privileges = |err: nix::Error| WorkerFailure::Privileges(err.to_string());
        let user = User::from_name(UNPRIVILEGED_USER)
            .map_err(privileges)?
            .ok_or_else(|| WorkerFailure::Privileges("account does not exist".to_owned()))?;
        let name = CString::new(user.name.clone())
            .map_err(|err| WorkerFailure::Privileges(err.to_string()))?;
        initgroups(&name, user.gid).map_err(privileges)?;
        setgid(user.gid).map_err(privileges)?;
        setuid(user.uid).map_err(privileges)?;

        // SAFETY: no other threads exist yet; the runtime is built afterwards.
        unsafe {
            env::set_var("HOME", &user.dir);
            env::set_var("USER", &user.name);
            env::set_var("LOGNAME", &user.name);
        }
        Ok(())
    }

    fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
        for (key, value) in environment {
            // SAFETY: called before the runtime starts, while the worker is
            // still single-threaded.
            unsafe {
                match value {
                    Some(secret) => env::set_var(key, secret.expose()),
                    None => env::remove_var(key),
                }
            }
        }
    }

    async fn drive(mut postgres: PostgreSQL, step: Step) -> Result<(), WorkerFailure> {
        let failed = |message: String| WorkerFailure::Lifecycle {
            operation: step.name(),
            message,
        };
        match step {
            Step::Setup => {
                postgres.setup().await.map_err(|err| failed(err.to_string()))?;
                start_unless_running(&mut postgres).await.map_err(failed)
            }
            Step::Start => {
                start_unless_running(&mut postgres).await.map_err(failed)?;
                // The server must outlive this process; skip the stopping drop.
                std::mem::forget(postgres);
                Ok(())
            }
            Step::Stop => postgres.stop().await.map_err(|err| failed(err.to_string())),
        }
    }

    async fn start_unless_running(postgres: &mut PostgreSQL) -> Result<(), String> {
        if matches!(postgres.status(), Status::Started) {
            return Ok(());
        }
        postgres.start().await.map_err(|err| err.to_string())
    }
}
