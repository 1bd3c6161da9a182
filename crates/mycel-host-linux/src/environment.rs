//! Desktop environment of a library terminal

use async_trait::async_trait;
use mycel_api::{HardwareSpecs, PrinterSpec};
use mycel_host_api::{Environment, HostError, HostResult};
use mycel_util::HardwareId;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{collect_specs, CommandRunner};

const XRANDR: &str = "/usr/bin/xrandr";
const LPADMIN: &str = "/usr/sbin/lpadmin";
const LPOPTIONS: &str = "/usr/bin/lpoptions";
const KILLALL: &str = "/usr/bin/killall";

/// Desktop session process; killing it logs the patron out
pub const DEFAULT_SESSION_PROCESS: &str = "lxsession";

/// Queue name used for the single legacy network printer
pub const LEGACY_PRINTER_NAME: &str = "publikumsskriver";

const HOMEPAGE_PREF: &str = "browser.startup.homepage";

/// Linux desktop environment (X11, CUPS, Firefox, LXDE)
#[derive(Debug, Clone)]
pub struct LinuxEnvironment {
    runner: CommandRunner,
    firefox_dir: Option<PathBuf>,
    session_process: String,
}

impl LinuxEnvironment {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            runner,
            firefox_dir: dirs::home_dir().map(|home| home.join(".mozilla").join("firefox")),
            session_process: DEFAULT_SESSION_PROCESS.into(),
        }
    }

    pub fn with_firefox_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.firefox_dir = Some(dir.into());
        self
    }

    async fn install_printer(&self, printer: &PrinterSpec, is_default: bool) -> HostResult<()> {
        let Some(args) = lpadmin_args(printer) else {
            warn!(printer_id = printer.id, "Printer has no name, skipping");
            return Ok(());
        };
        self.runner.run_privileged(LPADMIN, &args).await?;

        if is_default {
            if let Some(name) = printer.name.as_deref() {
                self.runner
                    .run_privileged(LPOPTIONS, &["-d".to_string(), name.to_string()])
                    .await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Environment for LinuxEnvironment {
    async fn apply_screen_resolution(&self, resolution: &str) -> HostResult<()> {
        let listing = self.runner.run(XRANDR, &[]).await?;
        let output = connected_output(&listing)
            .ok_or_else(|| HostError::command(XRANDR, "no connected output"))?;

        self.runner
            .run(
                XRANDR,
                &[
                    "--output".to_string(),
                    output.to_string(),
                    "--mode".to_string(),
                    resolution.to_string(),
                ],
            )
            .await?;

        info!(output, resolution, "Screen resolution set");
        Ok(())
    }

    async fn apply_homepage(&self, url: &str) -> HostResult<()> {
        let Some(dir) = self.firefox_dir.as_deref() else {
            return Err(HostError::Internal("No home directory".into()));
        };

        let profiles = find_prefs_files(dir).await?;
        if profiles.is_empty() {
            warn!(dir = %dir.display(), "No Firefox profile found");
        }

        for prefs in profiles {
            let content = tokio::fs::read_to_string(&prefs).await?;
            tokio::fs::write(&prefs, set_homepage_pref(&content, url)).await?;
            info!(profile = %prefs.display(), url, "Browser homepage set");
        }
        Ok(())
    }

    async fn apply_printers(
        &self,
        printers: &[PrinterSpec],
        default_printer_id: Option<i64>,
        legacy_address: Option<&str>,
    ) -> HostResult<()> {
        if printers.is_empty() {
            if let Some(address) = legacy_address {
                self.runner
                    .run_privileged(LPADMIN, &legacy_printer_args(address))
                    .await?;
                info!(address, "Legacy network printer set");
            }
            return Ok(());
        }

        // Keep going past a broken printer; report the first failure
        let mut first_error = None;
        for printer in printers {
            let is_default = default_printer_id == Some(printer.id);
            match self.install_printer(printer, is_default).await {
                Ok(()) => debug!(printer_id = printer.id, is_default, "Printer installed"),
                Err(e) => {
                    warn!(printer_id = printer.id, error = %e, "Printer setup failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn collect_hardware_specs(&self, hardware_id: &HardwareId) -> HostResult<HardwareSpecs> {
        Ok(collect_specs(&self.runner, hardware_id).await)
    }

    async fn end_session(&self) -> HostResult<()> {
        info!(process = %self.session_process, "Ending desktop session");
        self.runner
            .run(KILLALL, &[self.session_process.clone()])
            .await
            .map(|_| ())
    }
}

/// Name of the first connected output in `xrandr` output
pub fn connected_output(listing: &str) -> Option<&str> {
    listing.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        let name = words.next()?;
        (words.next() == Some("connected")).then_some(name)
    })
}

/// `lpadmin` arguments for one printer; `None` when it has no queue name
pub fn lpadmin_args(printer: &PrinterSpec) -> Option<Vec<String>> {
    let name = printer.name.as_deref().filter(|n| !n.trim().is_empty())?;

    let mut args = vec!["-p".to_string(), name.to_string(), "-E".to_string()];
    if let Some(options) = &printer.options {
        args.extend(options.split_whitespace().map(str::to_string));
    }

    let flags = [
        ("-m", &printer.driver),
        ("-v", &printer.uri),
        ("-L", &printer.location),
        ("-D", &printer.info),
    ];
    for (flag, value) in flags {
        if let Some(value) = value {
            args.push(flag.to_string());
            args.push(value.clone());
        }
    }

    Some(args)
}

pub fn legacy_printer_args(address: &str) -> Vec<String> {
    vec![
        "-p".to_string(),
        LEGACY_PRINTER_NAME.to_string(),
        "-E".to_string(),
        "-v".to_string(),
        address.to_string(),
    ]
}

/// Replace (or add) the homepage preference in a Firefox `prefs.js`
pub fn set_homepage_pref(prefs: &str, url: &str) -> String {
    // serde_json string quoting is valid JavaScript
    let quoted = serde_json::Value::from(url).to_string();
    let line = format!("user_pref(\"{}\", {});", HOMEPAGE_PREF, quoted);
    let marker = format!("user_pref(\"{}\",", HOMEPAGE_PREF);

    let mut replaced = false;
    let mut lines: Vec<String> = prefs
        .lines()
        .map(|l| {
            if l.trim_start().starts_with(&marker) {
                replaced = true;
                line.clone()
            } else {
                l.to_string()
            }
        })
        .collect();
    if !replaced {
        lines.push(line);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// `prefs.js` of every default profile under the Firefox directory
async fn find_prefs_files(firefox_dir: &Path) -> HostResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut entries = match tokio::fs::read_dir(firefox_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(found),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !name.to_string_lossy().contains(".default") {
            continue;
        }
        let prefs = entry.path().join("prefs.js");
        if tokio::fs::try_exists(&prefs).await.unwrap_or(false) {
            found.push(prefs);
        }
    }

    found.sort();
    Ok(found)
}
