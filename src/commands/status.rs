//! Module listing and installed-state tables.
use anyhow::Result;
use indexmap::IndexMap;
use std::fmt::Write as _;
use std::path::Path;

use super::{CommandSetup, emit};
use crate::config::Config;
use crate::engine::status::{InstallationStatus, LedgerEntry, installed_modules, load_status};
use crate::logging::truncate_chars;

const INSTALLED: &str = "✅ Installed";
const NOT_INSTALLED: &str = "⬚ Not installed";

/// Print the module list (`--list-modules`).
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run_list(setup: &CommandSetup) -> Result<()> {
    emit(&render_module_list(&setup.config))
}

/// Print the installed state of every module (`--status`).
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run_status(setup: &CommandSetup) -> Result<()> {
    let installed = installed_modules(&setup.config, &setup.ctx);
    let ledger = load_status(&setup.ctx.status_file);
    emit(&render_status(
        &setup.config,
        &installed,
        &ledger,
        &setup.ctx.install_dir,
    ))
}

/// Render every module with its default-enabled marker.
#[must_use]
pub fn render_module_list(config: &Config) -> String {
    let mut out = String::from("Available Modules:\n");
    let _ = writeln!(out, "{:<3} {:<15} {:<8} Description", "#", "Name", "Default");
    let _ = writeln!(out, "{}", "-".repeat(65));
    for (idx, (name, module)) in config.modules.iter().enumerate() {
        let default = if module.enabled { "✓" } else { "✗" };
        let _ = writeln!(
            out,
            "{:<3} {name:<15} {default:<8} {}",
            idx + 1,
            module.description
        );
    }
    out.push_str("\n✓ = installed by default when no --module specified\n");
    out
}

/// Render the `--status` table.
#[must_use]
pub fn render_status(
    config: &Config,
    installed: &IndexMap<String, bool>,
    ledger: &InstallationStatus,
    install_dir: &Path,
) -> String {
    let mut out = banner("Module Status");
    let _ = writeln!(
        out,
        "{:<3} {:<15} {:<15} {:<20} Description",
        "#", "Name", "Status", "Installed At"
    );
    let _ = writeln!(out, "{}", "-".repeat(70));
    for (idx, (name, module)) in config.modules.iter().enumerate() {
        let is_installed = installed.get(name).copied().unwrap_or(false);
        let (status, installed_at) = if is_installed {
            let at = ledger
                .modules
                .get(name)
                .and_then(LedgerEntry::installed_at)
                .map_or("", |at| truncate_chars(at, 16));
            (INSTALLED, at)
        } else {
            (NOT_INSTALLED, "")
        };
        let _ = writeln!(
            out,
            "{:<3} {name:<15} {status:<15} {installed_at:<20} {}",
            idx + 1,
            truncate_chars(&module.description, 25)
        );
    }
    let count = installed.values().filter(|v| **v).count();
    let _ = writeln!(
        out,
        "\nTotal: {count}/{} modules installed",
        config.modules.len()
    );
    let _ = writeln!(out, "Install dir: {}", install_dir.display());
    out
}

/// Render the interactive manager's table and command help.
#[must_use]
pub fn render_manager(
    config: &Config,
    installed: &IndexMap<String, bool>,
    install_dir: &Path,
) -> String {
    let mut out = banner("Module Manager");
    let _ = writeln!(out, "{:<3} {:<15} {:<15} Description", "#", "Name", "Status");
    let _ = writeln!(out, "{}", "-".repeat(70));
    for (idx, (name, module)) in config.modules.iter().enumerate() {
        let status = if installed.get(name).copied().unwrap_or(false) {
            INSTALLED
        } else {
            NOT_INSTALLED
        };
        let _ = writeln!(
            out,
            "{:<3} {name:<15} {status:<15} {}",
            idx + 1,
            truncate_chars(&module.description, 30)
        );
    }
    let count = installed.values().filter(|v| **v).count();
    let _ = writeln!(
        out,
        "\nInstalled: {count}/{} | Dir: {}",
        config.modules.len(),
        install_dir.display()
    );
    out.push_str("\nCommands:\n");
    out.push_str("  i <num/name>  - Install module(s)\n");
    out.push_str("  u <num/name>  - Uninstall module(s)\n");
    out.push_str("  q             - Quit\n\n");
    out
}

fn banner(title: &str) -> String {
    let rule = "=".repeat(70);
    format!("\n{rule}\n{title}\n{rule}\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::status::{ModuleRecord, RunStatus};
    use serde_json::json;

    fn config() -> Config {
        Config::from_document(
            json!({
                "version": "1.0",
                "install_dir": "~/.claude",
                "log_file": "install.log",
                "modules": {
                    "tools": {
                        "description": "Hook scripts and helper tools",
                        "enabled": true,
                        "operations": [
                            {"type": "copy_dir", "source": "templates/tools", "target": "tools"}
                        ]
                    },
                    "dev": {
                        "description": "Developer commands and agents",
                        "enabled": false,
                        "operations": [{"type": "merge_dir", "source": "dev"}]
                    }
                }
            }),
            Path::new("config.json"),
            Path::new("."),
        )
        .unwrap()
    }

    #[test]
    fn module_list() {
        insta::assert_snapshot!("module_list", render_module_list(&config()));
    }

    #[test]
    fn status_table_marks_installed_modules() {
        let config = config();
        let installed = IndexMap::from([("tools".to_string(), true), ("dev".to_string(), false)]);
        let mut ledger = InstallationStatus::default();
        let mut record = ModuleRecord::new("tools", RunStatus::Success);
        record.installed_at = "2026-01-02T03:04:05.000006".into();
        ledger.modules.insert("tools".into(), record.into());

        let table = render_status(&config, &installed, &ledger, Path::new("/home/me/.claude"));

        assert!(table.contains("1   tools           ✅ Installed     2026-01-02T03:04     Hook scripts and helper t\n"));
        assert!(table.contains("2   dev             ⬚ Not installed"));
        assert!(table.contains("Total: 1/2 modules installed"));
        assert!(table.contains("Install dir: /home/me/.claude"));
    }

    #[test]
    fn manager_table_lists_commands() {
        let config = config();
        let installed = IndexMap::from([("tools".to_string(), false), ("dev".to_string(), false)]);

        let table = render_manager(&config, &installed, Path::new("/tmp/claude"));

        assert!(table.contains("Installed: 0/2 | Dir: /tmp/claude"));
        assert!(table.contains("  u <num/name>  - Uninstall module(s)"));
    }
}
