use anyhow::Result;
use std::io::Write;
use trellis::{Apps, ModelFilter, ModelRef};

/// Prints the installed applications in installation order.
///
/// # Errors
/// Returns an error if the registry isn't populated or output can't be written.
pub fn list_apps(apps: &Apps, out: &mut impl Write) -> Result<()> {
    let configs = apps.get_app_configs()?;
    if configs.is_empty() {
        writeln!(out, "No applications installed.")?;
        return Ok(());
    }

    writeln!(out, "{:<15} {:<32} {:<35} Path", "Label", "Name", "Verbose name")?;
    writeln!(out, "{:-<100}", "")?;
    for config in &configs {
        writeln!(
            out,
            "{:<15} {:<32} {:<35} {}",
            config.label(),
            config.name(),
            config.verbose_name(),
            config.path().display()
        )?;
    }
    Ok(())
}

/// Prints registered models, optionally limited to the app with `app_label`.
/// `all` adds auto-created and swapped models.
///
/// # Errors
/// Returns an error for an unknown app label, an unpopulated registry or
/// unwritable output.
pub fn list_models(
    apps: &Apps,
    all: bool,
    app_label: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let filter = ModelFilter::new(all, all);
    let models: Vec<ModelRef> = match app_label {
        Some(label) => apps.get_app_config(label)?.get_models(filter)?,
        None => apps.get_models(filter)?.to_vec(),
    };

    if models.is_empty() {
        writeln!(out, "No models registered.")?;
        return Ok(());
    }

    writeln!(out, "{:<35} {:<40} Notes", "Model", "Module")?;
    writeln!(out, "{:-<100}", "")?;
    for model in &models {
        let opts = model.opts();
        writeln!(out, "{:<35} {:<40} {}", opts.label(), opts.module, notes(model))?;
    }
    Ok(())
}

/// Prints the options of the model named by `reference` (`app_label.ModelName`).
///
/// # Errors
/// Returns an error for a malformed reference or an unknown model.
pub fn describe_model(apps: &Apps, reference: &str, out: &mut impl Write) -> Result<()> {
    let model = apps.get_model(reference, None)?;
    let opts = model.opts();
    let app = apps.get_app_config(&opts.app_label)?;

    writeln!(out, "{:<14} {}", "Label:", opts.label())?;
    writeln!(out, "{:<14} {}", "Application:", app.name())?;
    writeln!(out, "{:<14} {}", "Module:", opts.module)?;
    writeln!(out, "{:<14} {}", "Auto-created:", yes_no(opts.auto_created))?;
    writeln!(out, "{:<14} {}", "Swappable:", opts.swappable.as_deref().unwrap_or("no"))?;
    writeln!(out, "{:<14} {}", "Swapped by:", opts.swapped.as_deref().unwrap_or("-"))?;
    Ok(())
}

fn notes(model: &ModelRef) -> String {
    let opts = model.opts();
    let mut notes = Vec::new();
    if opts.auto_created {
        notes.push("auto-created".to_owned());
    }
    if let Some(replacement) = &opts.swapped {
        notes.push(format!("swapped by {replacement}"));
    } else if let Some(setting) = &opts.swappable {
        notes.push(format!("swappable via {setting}"));
    }
    notes.join(", ")
}

const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
