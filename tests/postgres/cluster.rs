//! Embedded `PostgreSQL` cluster shared by the integration tests.
//!
//! The cluster starts once per test binary. Unprivileged runners host it in
//! process; root runners drive it through the `pg_worker` binary, which
//! switches to `nobody` before running `initdb`.

use crate::test_helpers::EnvVarGuard;
use cap_std::ambient_authority;
use cap_std::fs::{Dir, Permissions, PermissionsExt};
use diesel::prelude::*;
use pg_embedded_setup_unpriv::worker_process_test_api::{
    WorkerOperation, WorkerRequest, WorkerRequestArgs, run as run_worker,
};
use pg_embedded_setup_unpriv::{
    ExecutionPrivileges, TestBootstrapSettings, bootstrap_for_tests, detect_execution_privileges,
};
use postgresql_embedded::{PostgreSQL, Settings, Status};
use rstest::fixture;
use std::ffi::{OsStr, OsString};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tokio::runtime::Runtime;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared cluster handle.
pub type PostgresCluster = &'static ManagedCluster;

static SHARED_CLUSTER: OnceLock<ManagedCluster> = OnceLock::new();
static BOOT_LOCK: Mutex<()> = Mutex::new(());
static TEMPLATE_LOCK: Mutex<()> = Mutex::new(());

fn boxed(err: impl std::error::Error + Send + Sync + 'static) -> BoxError {
    Box::new(err)
}

/// Embedded cluster plus whatever keeps it alive.
pub struct ManagedCluster {
    bootstrap: TestBootstrapSettings,
    env_vars: Vec<(String, Option<String>)>,
    runtime: Option<Runtime>,
    postgres: Option<PostgreSQL>,
}

impl ManagedCluster {
    fn boot() -> Result<Self, BoxError> {
        let bootstrap_env = bootstrap_env_changes()?;
        let guard = EnvVarGuard::set_many(&bootstrap_env);
        let mut bootstrap = bootstrap_for_tests().map_err(boxed)?;
        drop(guard);
        read_password_file(&mut bootstrap.settings)?;
        let env_vars = bootstrap.environment.to_env();
        let mut cluster = Self {
            bootstrap,
            env_vars,
            runtime: None,
            postgres: None,
        };
        match cluster.bootstrap.privileges {
            ExecutionPrivileges::Root => cluster.start_via_worker()?,
            ExecutionPrivileges::Unprivileged => cluster.start_in_process()?,
        }
        Ok(cluster)
    }

    /// Returns the connection URL for `database`.
    #[must_use]
    pub fn database_url(&self, database: &str) -> String {
        self.bootstrap.settings.url(database)
    }

    /// Creates the template database once, running `migrate` against it.
    ///
    /// A template whose migration fails is dropped again so the next caller
    /// retries from scratch.
    pub fn ensure_template<F>(&self, template: &str, migrate: F) -> Result<(), BoxError>
    where
        F: FnOnce(&str) -> Result<(), BoxError>,
    {
        let _guard = TEMPLATE_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if self.database_exists(template)? {
            return Ok(());
        }
        self.admin_sql(&format!("CREATE DATABASE {}", quote_identifier(template)))?;
        if let Err(err) = migrate(&self.database_url(template)) {
            self.drop_database(template)?;
            return Err(err);
        }
        Ok(())
    }

    /// Clones `template` into a new database called `name`.
    pub fn clone_template(&self, name: &str, template: &str) -> Result<(), BoxError> {
        self.admin_sql(&format!(
            "CREATE DATABASE {} TEMPLATE {}",
            quote_identifier(name),
            quote_identifier(template),
        ))
    }

    /// Drops `name`, disconnecting any remaining sessions.
    pub fn drop_database(&self, name: &str) -> Result<(), BoxError> {
        self.admin_sql(&format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            quote_identifier(name)
        ))
    }

    fn start_in_process(&mut self) -> Result<(), BoxError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(boxed)?;
        let guard = EnvVarGuard::set_many(&to_os_pairs(&self.env_vars));
        let mut postgres = PostgreSQL::new(self.bootstrap.settings.clone());
        runtime.block_on(async {
            postgres.setup().await.map_err(boxed)?;
            if !matches!(postgres.status(), Status::Started) {
                postgres.start().await.map_err(boxed)?;
            }
            Ok::<(), BoxError>(())
        })?;
        drop(guard);
        self.bootstrap.settings = postgres.settings().clone();
        read_port_from_pid_file(&mut self.bootstrap.settings)?;
        self.runtime = Some(runtime);
        self.postgres = Some(postgres);
        Ok(())
    }

    fn start_via_worker(&mut self) -> Result<(), BoxError> {
        self.worker(WorkerOperation::Setup, self.bootstrap.setup_timeout)?;
        self.worker(WorkerOperation::Start, self.bootstrap.start_timeout)?;
        read_port_from_pid_file(&mut self.bootstrap.settings)
    }

    fn worker(&self, operation: WorkerOperation, timeout: Duration) -> Result<(), BoxError> {
        let worker = self.bootstrap.worker_binary.as_ref().ok_or_else(|| {
            boxed(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "PG_EMBEDDED_WORKER is not set",
            ))
        })?;
        let args = WorkerRequestArgs {
            worker: worker.as_path(),
            settings: &self.bootstrap.settings,
            env_vars: &self.env_vars,
            operation,
            timeout,
        };
        run_worker(&WorkerRequest::new(args)).map_err(boxed)
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        match (self.postgres.take(), &self.runtime) {
            (Some(postgres), Some(runtime)) => runtime.block_on(postgres.stop()).map_err(boxed),
            (None, _) if matches!(self.bootstrap.privileges, ExecutionPrivileges::Root) => {
                self.worker(WorkerOperation::Stop, self.bootstrap.shutdown_timeout)
            }
            _ => Ok(()),
        }
    }

    fn admin_sql(&self, sql: &str) -> Result<(), BoxError> {
        let mut connection =
            PgConnection::establish(&self.database_url("postgres")).map_err(boxed)?;
        diesel::sql_query(sql).execute(&mut connection).map_err(boxed)?;
        Ok(())
    }

    fn database_exists(&self, name: &str) -> Result<bool, BoxError> {
        #[derive(diesel::QueryableByName)]
        struct Found {
            #[diesel(sql_type = diesel::sql_types::Bool)]
            exists: bool,
        }

        let mut connection =
            PgConnection::establish(&self.database_url("postgres")).map_err(boxed)?;
        let found = diesel::sql_query(
            "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1) AS exists",
        )
        .bind::<diesel::sql_types::Text, _>(name)
        .get_result::<Found>(&mut connection)
        .map_err(boxed)?;
        Ok(found.exists)
    }
}

impl Drop for ManagedCluster {
    fn drop(&mut self) {
        drop(self.stop());
    }
}

/// Provides the shared cluster, starting it on first use.
#[fixture]
pub fn postgres_cluster() -> Result<PostgresCluster, BoxError> {
    if let Some(cluster) = SHARED_CLUSTER.get() {
        return Ok(cluster);
    }
    let _guard = BOOT_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(cluster) = SHARED_CLUSTER.get() {
        return Ok(cluster);
    }
    // Booting blocks on its own runtime, so keep it off the test's runtime.
    let cluster = std::thread::spawn(ManagedCluster::boot)
        .join()
        .map_err(|_| boxed(std::io::Error::other("cluster boot thread panicked")))??;
    Ok(SHARED_CLUSTER.get_or_init(|| cluster))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_os_pairs(env_vars: &[(String, Option<String>)]) -> Vec<(OsString, Option<OsString>)> {
    env_vars
        .iter()
        .map(|(key, value)| (OsString::from(key), value.as_ref().map(OsString::from)))
        .collect()
}

fn bootstrap_env_changes() -> Result<Vec<(OsString, Option<OsString>)>, BoxError> {
    let mut changes = Vec::new();
    if std::env::var_os("PG_PORT").is_none() {
        changes.push((OsString::from("PG_PORT"), Some(free_port()?)));
    }
    if matches!(detect_execution_privileges(), ExecutionPrivileges::Root)
        && std::env::var_os("PG_EMBEDDED_WORKER").is_none()
    {
        let worker = stage_worker(Path::new(env!("CARGO_BIN_EXE_pg_worker")))?;
        changes.push((
            OsString::from("PG_EMBEDDED_WORKER"),
            Some(worker.into_os_string()),
        ));
    }
    Ok(changes)
}

fn free_port() -> Result<OsString, BoxError> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(boxed)?;
    let port = listener.local_addr().map_err(boxed)?.port();
    Ok(OsString::from(port.to_string()))
}

/// Copies the worker somewhere `nobody` can execute it.
fn stage_worker(source: &Path) -> Result<PathBuf, BoxError> {
    let staged = std::env::temp_dir().join(format!("taskboard_pg_worker_{}", std::process::id()));
    let (source_dir, source_name) = open_parent(source)?;
    let (staged_dir, staged_name) = open_parent(&staged)?;
    if staged_dir.exists(staged_name) {
        staged_dir.remove_file(staged_name).map_err(boxed)?;
    }
    source_dir
        .copy(source_name, &staged_dir, staged_name)
        .map_err(boxed)?;
    staged_dir
        .set_permissions(staged_name, Permissions::from_mode(0o755))
        .map_err(boxed)?;
    Ok(staged)
}

fn open_parent(path: &Path) -> Result<(Dir, &OsStr), BoxError> {
    let name = path
        .file_name()
        .ok_or_else(|| boxed(std::io::Error::other("path has no file name")))?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(boxed)?;
    Ok((dir, name))
}

fn read_password_file(settings: &mut Settings) -> Result<(), BoxError> {
    let (dir, name) = open_parent(&settings.password_file)?;
    match dir.read_to_string(name) {
        Ok(contents) if !contents.trim_end().is_empty() => {
            contents.trim_end().clone_into(&mut settings.password);
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(boxed(err)),
    }
}

/// The fourth line of `postmaster.pid` holds the port actually bound.
fn read_port_from_pid_file(settings: &mut Settings) -> Result<(), BoxError> {
    let data_dir =
        Dir::open_ambient_dir(&settings.data_dir, ambient_authority()).map_err(boxed)?;
    let contents = match data_dir.read_to_string("postmaster.pid") {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(boxed(err)),
    };
    if let Some(port) = contents
        .lines()
        .nth(3)
        .and_then(|line| line.trim().parse::<u16>().ok())
    {
        settings.port = port;
    }
    Ok(())
}
