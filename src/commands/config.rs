//! Implementation of the `hubqueue config` commands.

use clap::Subcommand;
use serde_json::Value;

use crate::{
    config::{DEFAULT_REPO_PREF, EDITOR_PREF, coerce_value, display_value},
    context::Context,
    error::{Error, Result},
    github::RepoName,
    palette,
    paths::display_path,
    system::open_in_editor,
    table::{OutputFormat, Table},
};

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show every preference.
    List {
        /// Output format.
        #[arg(long, value_enum, default_value = "simple")]
        format: OutputFormat,
    },
    /// Print one preference.
    Get {
        /// Preference name.
        key: String,
    },
    /// Set a preference (`true`/`false` and integers are stored typed).
    Set {
        /// Preference name.
        key: String,
        /// New value.
        value: String,
    },
    /// Remove a preference.
    Unset {
        /// Preference name.
        key: String,
    },
    /// Open the configuration file in your editor.
    Edit,
    /// Set the editor used by `config edit`.
    SetEditor {
        /// Editor command line, e.g. `code --wait`.
        editor: String,
    },
    /// Print the editor that would be used.
    GetEditor,
    /// Set the repository used when `--repo` is omitted.
    SetRepo {
        /// Repository as `owner/repo`.
        repo: String,
    },
    /// Print the default repository.
    GetRepo,
}

/// Execute a config subcommand.
pub async fn run(ctx: &mut Context, command: ConfigCommand) -> Result<()> {
    let color = ctx.use_color();
    match command {
        ConfigCommand::List { format } => {
            list(ctx, format);
            Ok(())
        }
        ConfigCommand::Get { key } => match ctx.config().preference(&key) {
            Some(value) => {
                println!("{}", display_value(value));
                Ok(())
            }
            None => Err(Error::NotFound {
                what: format!("Preference '{key}'"),
            }),
        },
        ConfigCommand::Set { key, value } => {
            let value = coerce_value(&value);
            let shown = display_value(&value);
            ctx.config_mut().set_preference(&key, value)?;
            println!("Set {} = {shown}", palette::fmt_name(&key, color));
            Ok(())
        }
        ConfigCommand::Unset { key } => {
            if ctx.config_mut().unset_preference(&key)? {
                println!("Removed {}", palette::fmt_name(&key, color));
            } else {
                println!("Preference '{key}' was not set.");
            }
            Ok(())
        }
        ConfigCommand::Edit => {
            let config = ctx.config();
            if !config.path().exists() {
                config.save()?;
            }
            open_in_editor(&config.editor(), config.path())
        }
        ConfigCommand::SetEditor { editor } => {
            ctx.config_mut()
                .set_preference(EDITOR_PREF, Value::String(editor.clone()))?;
            println!("Editor set to {}", palette::fmt_name(&editor, color));
            Ok(())
        }
        ConfigCommand::GetEditor => {
            println!("{}", ctx.config().editor());
            Ok(())
        }
        ConfigCommand::SetRepo { repo } => {
            let repo = RepoName::parse(&repo)?;
            ctx.config_mut()
                .set_preference(DEFAULT_REPO_PREF, Value::String(repo.to_string()))?;
            println!(
                "Default repository set to {}",
                palette::fmt_name(&repo.to_string(), color)
            );
            Ok(())
        }
        ConfigCommand::GetRepo => {
            match ctx.config().default_repo() {
                Some(repo) => println!("{repo}"),
                None => println!("No default repository set."),
            }
            Ok(())
        }
    }
}

/// `config list`.
fn list(ctx: &Context, format: OutputFormat) {
    let color = ctx.use_color();
    let config = ctx.config();
    let preferences = config.preferences();
    println!(
        "{} {}",
        palette::fmt_label("Config file:", color),
        palette::fmt_path(&display_path(config.path()), color)
    );
    println!(
        "{} {}",
        palette::fmt_label("Token:", color),
        if config.token().is_some() {
            "saved"
        } else {
            "not saved"
        }
    );
    if preferences.is_empty() {
        println!("No preferences set.");
        return;
    }
    match format {
        OutputFormat::Simple => {
            for (key, value) in &preferences {
                println!("{} = {}", palette::fmt_name(key, color), display_value(value));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["Key", "Value"]);
            for (key, value) in &preferences {
                table.row([key.clone(), display_value(value)]);
            }
            println!("{}", table.render());
        }
    }
}
