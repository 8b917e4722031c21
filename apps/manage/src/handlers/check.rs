use anyhow::{Result, bail};
use std::io::Write;
use trellis::{Apps, ModelFilter};

/// Reports the populated registry and every model reference still awaited by a
/// deferred operation.
///
/// # Errors
/// Returns an error when unresolved references remain or output can't be written.
pub fn run_check(apps: &Apps, out: &mut impl Write) -> Result<()> {
    let configs = apps.get_app_configs()?;
    let models = apps.get_models(ModelFilter::ALL)?;
    let pending = apps.pending_model_keys();

    if pending.is_empty() {
        writeln!(
            out,
            "System check identified no issues ({} apps, {} models).",
            configs.len(),
            models.len()
        )?;
        return Ok(());
    }

    writeln!(out, "Unresolved model references:")?;
    for key in &pending {
        writeln!(out, "  {key}")?;
    }

    bail!("System check identified {} unresolved model reference(s)", pending.len())
}
