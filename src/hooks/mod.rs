use std::path::Path;

use crate::error::{Result, StampError};
use crate::render::VariableBindings;

/// Run an already-rendered post-create command in the output directory.
///
/// Every binding is exported as `STAMP_<NAME>` (upper-cased) so scripts can
/// read answers without re-parsing anything.
pub fn run_post_create(
    command: &str,
    output_dir: &Path,
    bindings: &VariableBindings,
) -> Result<()> {
    let envs = bindings
        .iter()
        .map(|(k, v)| (format!("STAMP_{}", k.to_uppercase()), v.to_string()));

    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(output_dir)
        .envs(envs)
        .status()
        .map_err(|e| StampError::HookError {
            hook: "post_create".to_string(),
            message: format!("failed to execute: {e}"),
        })?;

    if !status.success() {
        return Err(StampError::HookError {
            hook: "post_create".to_string(),
            message: format!("exited with status {status}"),
        });
    }
    Ok(())
}
