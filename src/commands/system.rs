//! Implementation of the `hubqueue system` commands.

use std::path::PathBuf;

use clap::Subcommand;

use crate::{
    context::Context,
    error::Result,
    palette,
    paths::display_path,
    system::{
        self, CRATES_IO_URL, SetupOptions, check_dependencies, format_bytes, git_config,
        set_git_config, system_info, windows_compatibility,
    },
    table::{OutputFormat, Table},
};

/// System subcommands.
#[derive(Debug, Subcommand)]
pub enum SystemCommand {
    /// Show host, tool, and environment details.
    Info {
        /// Include environment variables.
        #[arg(long)]
        env: bool,
    },
    /// Check that required external tools are installed.
    CheckDependencies {
        /// Output format.
        #[arg(long, value_enum, default_value = "simple")]
        format: OutputFormat,
    },
    /// Show or change git settings.
    GitConfig {
        /// Setting to change (requires a value).
        #[arg(requires = "value")]
        key: Option<String>,
        /// New value.
        value: Option<String>,
        /// Write to the repository config instead of the global one.
        #[arg(long)]
        local: bool,
    },
    /// Prepare configuration directories and git identity.
    Setup {
        /// Global git `user.name`.
        #[arg(long)]
        name: Option<String>,
        /// Global git `user.email`.
        #[arg(long)]
        email: Option<String>,
        /// Leave `credential.helper` untouched.
        #[arg(long)]
        no_credential_helper: bool,
    },
    /// Write a JSON report of the environment.
    Export {
        /// Output file (defaults to a timestamped file in the temp dir).
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Check crates.io for a newer release.
    CheckUpdates,
    /// Report Windows-specific environment details.
    WindowsCompatibility,
}

/// Execute a system subcommand.
pub async fn run(ctx: &Context, command: SystemCommand) -> Result<()> {
    let color = ctx.use_color();
    match command {
        SystemCommand::Info { env } => {
            info(color, env);
            Ok(())
        }
        SystemCommand::CheckDependencies { format } => {
            dependencies(ctx, format);
            Ok(())
        }
        SystemCommand::GitConfig { key, value, local } => match (key, value) {
            (Some(key), Some(value)) => {
                set_git_config(&key, &value, !local)?;
                println!("Set {} = {value}", palette::fmt_name(&key, color));
                Ok(())
            }
            _ => {
                for (key, value) in git_config()? {
                    println!(
                        "{} = {}",
                        palette::fmt_name(&key, color),
                        value.as_deref().unwrap_or("(not set)")
                    );
                }
                Ok(())
            }
        },
        SystemCommand::Setup {
            name,
            email,
            no_credential_helper,
        } => {
            let options = SetupOptions {
                user_name: name,
                user_email: email,
                credential_helper: !no_credential_helper,
            };
            let report = system::setup(ctx.config(), &options)?;
            for path in &report.created {
                println!("Created {}", palette::fmt_path(&display_path(path), color));
            }
            for (key, value) in &report.git_settings {
                println!("Set git {} = {value}", palette::fmt_name(key, color));
            }
            if report.created.is_empty() && report.git_settings.is_empty() {
                println!("Nothing to do; environment is already set up.");
            }
            Ok(())
        }
        SystemCommand::Export { output } => {
            let path = system::export(output.as_deref(), &ctx.config().editor())?;
            println!(
                "Environment report written to {}",
                palette::fmt_path(&display_path(&path), color)
            );
            Ok(())
        }
        SystemCommand::CheckUpdates => {
            let status = system::check_updates(CRATES_IO_URL).await?;
            println!("Current version: {}", status.current_version);
            println!("Latest version: {}", status.latest_version);
            if status.update_available {
                println!(
                    "{}",
                    palette::fmt_warning("A different version is published on crates.io.", color)
                );
            } else {
                println!("You are running the latest version.");
            }
            Ok(())
        }
        SystemCommand::WindowsCompatibility => {
            windows(color);
            Ok(())
        }
    }
}

/// `yes`/`no` for report flags.
fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// `system info`.
fn info(color: bool, show_env: bool) {
    let info = system_info();
    let mut table = Table::bare();
    table
        .row(["OS", &format!("{} {}", info.os, info.os_version)])
        .row(["Kernel", &info.kernel_version])
        .row(["Architecture", &info.architecture])
        .row(["Hostname", &info.hostname])
        .row(["CPUs", &info.cpu_count.to_string()])
        .row([
            "Memory",
            &format!(
                "{} used of {}",
                format_bytes(info.used_memory),
                format_bytes(info.total_memory)
            ),
        ])
        .row(["Git", &info.git_version])
        .row(["hubqueue", &info.tool_version]);
    println!("{}", palette::fmt_heading("System information", color));
    println!("{}", table.render());
    if show_env {
        println!("\n{}", palette::fmt_heading("Environment", color));
        for (key, value) in &info.environment {
            println!("{}={value}", palette::fmt_name(key, color));
        }
    }
}

/// `system check-dependencies`.
fn dependencies(ctx: &Context, format: OutputFormat) {
    let color = ctx.use_color();
    let checks = check_dependencies(&ctx.config().editor());
    match format {
        OutputFormat::Simple => {
            for (name, found) in &checks {
                let state = if *found { "installed" } else { "missing" };
                println!(
                    "{}: {}",
                    palette::fmt_name(name, color),
                    palette::fmt_state(state, color)
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["Tool", "Installed"]);
            for (name, found) in &checks {
                table.row([name.as_str(), yes_no(*found)]);
            }
            println!("{}", table.render());
        }
    }
}

/// `system windows-compatibility`.
fn windows(color: bool) {
    let report = windows_compatibility();
    println!("{}", palette::fmt_heading("Windows compatibility", color));
    let mut table = Table::bare();
    table
        .row(["Windows", yes_no(report.is_windows)])
        .row(["Release", report.release.as_deref().unwrap_or("-")])
        .row(["WSL", yes_no(report.is_wsl)])
        .row(["PowerShell", yes_no(report.is_powershell)])
        .row(["cmd.exe", yes_no(report.is_cmd)])
        .row(["Git Bash", yes_no(report.git_bash_available)]);
    println!("{}", table.render());
}
