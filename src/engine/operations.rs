//! Operation executor: applies one configured operation to the filesystem.
use indexmap::IndexMap;
use std::path::Path;

use super::context::ExecutionContext;
use crate::config::Operation;
use crate::error::OperationError;
use crate::exec::{self, ShellCommand};
use crate::logging::LogEntry;
use crate::resources::copy::{CopyDirResource, CopyFileResource};
use crate::resources::json::MergeJsonResource;
use crate::resources::merge_dir::MergeDirResource;
use crate::resources::{Applicable, ResourceChange};

/// Token substituted with the install directory in `run_command` env values.
const INSTALL_DIR_TOKEN: &str = "${install_dir}";

/// Apply `op`, logging one `INFO` entry describing what was done or skipped.
///
/// Paths newly created inside the install directory by `copy_dir`,
/// `copy_file` and `merge_json` are recorded on `ctx` for rollback, including
/// a partially-written target left behind by a failure.
///
/// # Errors
///
/// Returns [`OperationError::SourceNotFound`] for a missing source,
/// [`OperationError::CommandFailed`] for a non-zero exit, and
/// [`OperationError::Io`] for any other failure.
pub fn execute_operation(op: &Operation, ctx: &mut ExecutionContext) -> Result<(), OperationError> {
    match op {
        Operation::CopyDir { source, target } => copy_dir(ctx, Path::new(source), Path::new(target)),
        Operation::CopyFile { source, target } => {
            copy_file(ctx, Path::new(source), Path::new(target))
        }
        Operation::MergeDir { source } => merge_dir(ctx, Path::new(source)),
        Operation::MergeJson {
            source,
            target,
            merge_key,
        } => merge_json(ctx, Path::new(source), Path::new(target), merge_key.as_deref()),
        Operation::RunCommand { command, env } => run_command(ctx, command, env),
    }
}

fn copy_dir(ctx: &mut ExecutionContext, source: &Path, target: &Path) -> Result<(), OperationError> {
    let src = ctx.source_path(source);
    let dst = ctx.target_path(target);
    let resource = CopyDirResource::new(src.clone(), dst.clone(), ctx.force);

    match apply_recording(ctx, &resource, &dst)? {
        ResourceChange::Skipped { .. } => {
            ctx.log.info(&format!("Skip existing dir: {}", dst.display()));
        }
        ResourceChange::Applied | ResourceChange::AlreadyCorrect => {
            let msg = format!("Copied dir {} -> {}", src.display(), dst.display());
            ctx.log.info(&msg);
        }
    }
    Ok(())
}

fn copy_file(
    ctx: &mut ExecutionContext,
    source: &Path,
    target: &Path,
) -> Result<(), OperationError> {
    let src = ctx.source_path(source);
    let dst = ctx.target_path(target);
    let resource = CopyFileResource::new(src.clone(), dst.clone(), ctx.force);

    match apply_recording(ctx, &resource, &dst)? {
        ResourceChange::Skipped { .. } => {
            ctx.log.info(&format!("Skip existing file: {}", dst.display()));
        }
        ResourceChange::Applied | ResourceChange::AlreadyCorrect => {
            let msg = format!("Copied file {} -> {}", src.display(), dst.display());
            ctx.log.info(&msg);
        }
    }
    Ok(())
}

fn merge_dir(ctx: &ExecutionContext, source: &Path) -> Result<(), OperationError> {
    let src = ctx.source_path(source);
    let merged = MergeDirResource::new(src.clone(), ctx.install_dir.clone(), ctx.force)
        .merge()
        .map_err(into_operation_error)?;

    let name = src
        .file_name()
        .map_or_else(|| src.display().to_string(), |n| n.to_string_lossy().into_owned());
    let files = if merged.is_empty() {
        "no files".to_string()
    } else {
        merged.join(", ")
    };
    ctx.log.info(&format!("Merged {name}: {files}"));
    Ok(())
}

fn merge_json(
    ctx: &mut ExecutionContext,
    source: &Path,
    target: &Path,
    merge_key: Option<&str>,
) -> Result<(), OperationError> {
    let src = ctx.source_path(source);
    let dst = ctx.target_path(target);
    let resource = MergeJsonResource::new(src, dst.clone(), merge_key.map(str::to_string));

    apply_recording(ctx, &resource, &dst)?;
    ctx.log.info(&format!("Merged JSON {}", resource.description()));
    Ok(())
}

fn run_command(
    ctx: &ExecutionContext,
    command: &str,
    env: &IndexMap<String, String>,
) -> Result<(), OperationError> {
    let install_dir = ctx.install_dir.display().to_string();
    let env: Vec<(String, String)> = env
        .iter()
        .map(|(key, value)| (key.clone(), value.replace(INSTALL_DIR_TOKEN, &install_dir)))
        .collect();
    let command = ctx.platform.translate_command(command);

    let result = exec::run_shell_streaming(
        &ctx.platform,
        &ShellCommand {
            command: &command,
            cwd: &ctx.config_dir,
            env: &env,
        },
    )?;
    let code = result.code.unwrap_or(-1);

    ctx.log.write(
        &LogEntry::info(format!("Command: {command}")).with_output(
            result.stdout.clone(),
            result.stderr.clone(),
            code,
        ),
    );

    if result.success {
        Ok(())
    } else {
        Err(OperationError::CommandFailed {
            command,
            code,
            stdout: result.stdout,
            stderr: result.stderr,
        })
    }
}

/// Apply `resource` and record `target` as created if it did not exist
/// before, whether or not the apply succeeded.
fn apply_recording(
    ctx: &mut ExecutionContext,
    resource: &dyn Applicable,
    target: &Path,
) -> Result<ResourceChange, OperationError> {
    let existed = target.exists();
    let result = resource.apply();
    if !existed && target.exists() {
        ctx.record_created(target);
    }
    result.map_err(into_operation_error)
}

/// Recover a typed [`OperationError`] raised inside a resource.
fn into_operation_error(err: anyhow::Error) -> OperationError {
    err.downcast::<OperationError>().unwrap_or_else(OperationError::Io)
}
