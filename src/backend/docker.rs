//! Backend driving the `docker compose` CLI plugin

use super::{Backend, CreateOptions, LogConsumer, RecreatePolicy, StartOptions, UpRequest};
use crate::compose::ProjectView;
use crate::error::{DcmError, Result};
use crate::settings::RuntimeConfig;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Docker binary, overridable through `DOCKER_BIN`
pub fn resolve_docker_binary() -> String {
    std::env::var("DOCKER_BIN").unwrap_or_else(|_| "docker".to_string())
}

/// Runs lifecycle operations through `docker compose`
#[derive(Debug, Clone)]
pub struct DockerComposeBackend {
    docker_bin: String,
    host: String,
}

impl DockerComposeBackend {
    /// Create a backend talking to the daemon at `config.docker_addr`
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            docker_bin: resolve_docker_binary(),
            host: config.docker_addr.clone(),
        }
    }

    /// Use a different docker binary
    pub fn with_binary(mut self, docker_bin: impl Into<String>) -> Self {
        self.docker_bin = docker_bin.into();
        self
    }

    /// Arguments for `docker compose create`
    pub fn create_args(project: &ProjectView, options: &CreateOptions) -> Vec<String> {
        let mut args = project_args(project);
        args.push("create".to_string());
        push_recreate(&mut args, options.recreate);
        if options.remove_orphans {
            args.push("--remove-orphans".to_string());
        }
        push_scale(&mut args, project);
        push_services(&mut args, project, options);
        args
    }

    /// Arguments for `docker compose up`
    pub fn up_args(
        project: &ProjectView,
        create: &CreateOptions,
        start: &StartOptions,
        attached: bool,
    ) -> Vec<String> {
        let mut args = project_args(project);
        args.push("up".to_string());

        push_recreate(&mut args, create.recreate);
        if create.recreate_dependencies == RecreatePolicy::Force {
            args.push("--always-recreate-deps".to_string());
        }
        if create.remove_orphans {
            args.push("--remove-orphans".to_string());
        }
        if !create.inherit {
            args.push("--renew-anon-volumes".to_string());
        }
        if create.quiet_pull {
            args.push("--quiet-pull".to_string());
        }
        push_scale(&mut args, project);

        if attached {
            for target in &start.attach_to {
                args.push("--attach".to_string());
                args.push(target.clone());
            }
        } else {
            args.push("--detach".to_string());
        }
        if start.wait {
            args.push("--wait".to_string());
        }
        if start.cascade_stop {
            args.push("--abort-on-container-exit".to_string());
        }
        if let Some(service) = &start.exit_code_from {
            args.push("--exit-code-from".to_string());
            args.push(service.clone());
        }

        push_services(&mut args, project, create);
        args
    }

    fn command(&self, args: &[String], ignore_orphans: bool) -> Command {
        tracing::debug!("Running {} {}", self.docker_bin, args.join(" "));

        let mut command = Command::new(&self.docker_bin);
        command
            .args(args)
            .env("DOCKER_HOST", &self.host)
            .stdin(Stdio::null());
        if ignore_orphans {
            command.env("COMPOSE_IGNORE_ORPHANS", "true");
        }
        command
    }

    async fn run(&self, mut command: Command, consumer: Option<&dyn LogConsumer>) -> Result<ExitStatus> {
        let spawn_err =
            |e: std::io::Error| DcmError::Backend(format!("Failed to run {}: {}", self.docker_bin, e));

        let Some(consumer) = consumer else {
            return command.status().await.map_err(spawn_err);
        };

        let mut child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        tokio::join!(
            forward_lines(stdout, |container, message| consumer.log(container, message)),
            forward_lines(stderr, |container, message| consumer.err(container, message)),
        );

        child
            .wait()
            .await
            .map_err(|e| DcmError::Backend(format!("Failed to wait for {}: {}", self.docker_bin, e)))
    }
}

impl Backend for DockerComposeBackend {
    async fn create(&self, project: &ProjectView, options: &CreateOptions) -> Result<()> {
        let args = Self::create_args(project, options);
        let status = self
            .run(self.command(&args, options.ignore_orphans), None)
            .await?;
        check_status("create", &project.name, status)
    }

    async fn up(&self, project: &ProjectView, request: UpRequest<'_>) -> Result<()> {
        let args = Self::up_args(
            project,
            request.create,
            request.start,
            request.consumer.is_some(),
        );

        let mut command = self.command(&args, request.create.ignore_orphans);
        if request.consumer.is_some() {
            command.env("COMPOSE_ANSI", "never");
        }

        let status = self.run(command, request.consumer).await?;
        check_status("up", &project.name, status)
    }
}

fn check_status(operation: &str, project: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }

    Err(DcmError::Backend(match status.code() {
        Some(code) => format!("compose {} for '{}' exited with code {}", operation, project, code),
        None => format!("compose {} for '{}' was terminated by a signal", operation, project),
    }))
}

fn project_args(project: &ProjectView) -> Vec<String> {
    let mut args = vec![
        "compose".to_string(),
        "--project-name".to_string(),
        project.name.clone(),
        "--project-directory".to_string(),
        project.working_dir.display().to_string(),
    ];
    for path in &project.config_paths {
        args.push("--file".to_string());
        args.push(path.display().to_string());
    }
    args
}

fn push_recreate(args: &mut Vec<String>, policy: RecreatePolicy) {
    match policy {
        RecreatePolicy::Diverged => {}
        RecreatePolicy::Force => args.push("--force-recreate".to_string()),
        RecreatePolicy::Never => args.push("--no-recreate".to_string()),
    }
}

fn push_scale(args: &mut Vec<String>, project: &ProjectView) {
    for service in &project.enabled {
        if let Some(replicas) = service.replicas {
            args.push("--scale".to_string());
            args.push(format!("{}={}", service.name, replicas));
        }
    }
}

/// Explicit services win; otherwise a filtered view names its enabled set.
fn push_services(args: &mut Vec<String>, project: &ProjectView, options: &CreateOptions) {
    if !options.services.is_empty() {
        args.extend(options.services.iter().cloned());
    } else if !project.disabled.is_empty() {
        args.extend(project.enabled_names());
    }
}

/// Feed every line of `stream` to `emit`.
///
/// Output is not required to be UTF-8; a read error ends forwarding but
/// leaves the exit status to decide the outcome.
async fn forward_lines<R, F>(stream: Option<R>, mut emit: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(&str, &str),
{
    let Some(stream) = stream else {
        return;
    };

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let (container, message) = split_log_line(line.trim_end_matches(['\n', '\r']));
                emit(container, message);
            }
            Err(e) => {
                tracing::warn!("Failed to read container output: {}", e);
                break;
            }
        }
    }
}

/// Split a `name | message` line as printed by `docker compose`
fn split_log_line(line: &str) -> (&str, &str) {
    match line.split_once(" | ") {
        Some((container, message)) => (container.trim(), message),
        None => ("", line),
    }
}
