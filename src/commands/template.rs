//! Implementation of the `hubqueue template` commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::{
    archive::{self, MAX_DOWNLOAD_SIZE, MAX_ZIPBALL_SIZE},
    commands::confirm,
    config::display_value,
    context::Context,
    diagnostics::Diagnostics,
    error::{Error, Result},
    github::{RepoName, actions::parse_inputs},
    palette,
    paths::display_path,
    table::{OutputFormat, Table},
    template::{DEFAULT_TEMPLATE_VERSION, TemplateDescriptor, TemplateInfo, TemplateStore},
};

/// Template subcommands.
#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// List installed templates.
    List {
        /// Output format.
        #[arg(long, value_enum, default_value = "simple")]
        format: OutputFormat,
    },
    /// Show a template's descriptor and variables.
    View {
        /// Template name.
        name: String,
    },
    /// Install a local directory as a template.
    Create {
        /// Template name.
        name: String,
        /// Directory to copy.
        source: PathBuf,
        /// Template description.
        #[arg(long, short = 'd', default_value = "")]
        description: String,
        /// Template version.
        #[arg(long, default_value = DEFAULT_TEMPLATE_VERSION)]
        version: String,
        /// Variable default as `name=value` (repeatable).
        #[arg(long = "var")]
        vars: Vec<String>,
        /// Variable that must be given at generation (repeatable).
        #[arg(long)]
        required: Vec<String>,
    },
    /// Remove a template.
    Delete {
        /// Template name.
        name: String,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Install a template from a GitHub repository.
    ImportGithub {
        /// Repository as `owner/repo`.
        repo: String,
        /// Directory inside the repository to use.
        #[arg(long)]
        path: Option<String>,
        /// Branch, tag, or commit.
        #[arg(long = "ref")]
        git_ref: Option<String>,
        /// Template name (defaults to the repository or directory name).
        #[arg(long)]
        name: Option<String>,
        /// Template description.
        #[arg(long, short = 'd')]
        description: Option<String>,
    },
    /// Install a template from a ZIP archive served over HTTPS.
    ImportUrl {
        /// Archive URL.
        url: String,
        /// Template name.
        #[arg(long)]
        name: String,
        /// Directory inside the archive to use.
        #[arg(long)]
        path: Option<String>,
        /// Template description.
        #[arg(long, short = 'd')]
        description: Option<String>,
    },
    /// Render a template into a directory.
    Generate {
        /// Template name.
        name: String,
        /// Output directory.
        output: PathBuf,
        /// Variable as `key=value` (repeatable).
        #[arg(long = "var")]
        vars: Vec<String>,
    },
    /// Show the variables a template declares.
    Variables {
        /// Template name.
        name: String,
    },
}

/// Execute a template subcommand.
pub async fn run(ctx: &Context, command: TemplateCommand) -> Result<()> {
    let store = TemplateStore::new(ctx.config().templates_dir()?);
    let color = ctx.use_color();
    match command {
        TemplateCommand::List { format } => list(ctx, &store, format),
        TemplateCommand::View { name } => view(ctx, &store, &name),
        TemplateCommand::Create {
            name,
            source,
            description,
            version,
            vars,
            required,
        } => {
            let descriptor = TemplateDescriptor::new(&name, &description)
                .with_version(&version)
                .with_variables(&parse_inputs(&vars)?, &required);
            let template = store.create(&source, descriptor)?;
            print_installed(&template, color);
            Ok(())
        }
        TemplateCommand::Delete { name, yes } => {
            if !yes && !confirm(&format!("Delete template {name}?"), false)? {
                println!("Aborted.");
                return Ok(());
            }
            let directory = store.delete(&name)?;
            println!(
                "Deleted template {} ({})",
                palette::fmt_name(&name, color),
                display_path(&directory)
            );
            Ok(())
        }
        TemplateCommand::ImportGithub {
            repo,
            path,
            git_ref,
            name,
            description,
        } => {
            let source = GithubSource {
                repo: RepoName::parse(&repo)?,
                path,
                git_ref,
            };
            import_github(ctx, &store, &source, name, description.as_deref()).await
        }
        TemplateCommand::ImportUrl {
            url,
            name,
            path,
            description,
        } => {
            let data = archive::download_https(&url, MAX_DOWNLOAD_SIZE).await?;
            let description = description.unwrap_or_else(|| format!("Imported from {url}"));
            let prefix = path.unwrap_or_default();
            let template = store.install(TemplateDescriptor::new(&name, &description), |target| {
                extract_nonempty(&data, &prefix, target)
            })?;
            print_installed(&template, color);
            Ok(())
        }
        TemplateCommand::Generate { name, output, vars } => {
            let values = parse_inputs(&vars)?;
            let written = store.generate(&name, &output, &values)?;
            println!(
                "Generated {} file(s) from {} into {}",
                written.len(),
                palette::fmt_name(&name, color),
                palette::fmt_path(&display_path(&output), color)
            );
            for path in &written {
                println!("  {}", display_path(path));
            }
            Ok(())
        }
        TemplateCommand::Variables { name } => {
            let variables = store.variables(&name)?;
            if variables.is_empty() {
                println!("Template {name} declares no variables.");
                return Ok(());
            }
            let mut table = Table::new(["Name", "Required", "Default", "Description"]);
            for (key, spec) in &variables {
                table.row([
                    key.clone(),
                    if spec.required { "yes" } else { "no" }.to_string(),
                    spec.default
                        .as_ref()
                        .map(display_value)
                        .unwrap_or_default(),
                    spec.description.clone().unwrap_or_default(),
                ]);
            }
            println!("{}", table.render());
            Ok(())
        }
    }
}

/// Report a newly installed template.
fn print_installed(template: &TemplateInfo, color: bool) {
    println!(
        "Created template {} at {}",
        palette::fmt_name(&template.descriptor.name, color),
        palette::fmt_path(&display_path(&template.directory), color)
    );
}

/// Extract `prefix` from an archive, failing when nothing matched.
fn extract_nonempty(data: &[u8], prefix: &str, target: &Path) -> Result<()> {
    let written = archive::extract_zip(data, prefix, target)?;
    if written.is_empty() {
        return Err(Error::InvalidZip {
            message: format!("no files found under '{prefix}'"),
        });
    }
    Ok(())
}

/// `template list`.
fn list(ctx: &Context, store: &TemplateStore, format: OutputFormat) -> Result<()> {
    let color = ctx.use_color();
    let (templates, broken) = store.list()?;
    let mut diagnostics = Diagnostics::new(color);
    for entry in &broken {
        diagnostics.warn_skipped(&entry.directory, entry.reason.clone());
    }
    if templates.is_empty() {
        println!(
            "No templates found in {}",
            palette::fmt_path(&display_path(store.root()), color)
        );
    } else {
        match format {
            OutputFormat::Simple => {
                for template in &templates {
                    println!(
                        "{} - {}",
                        palette::fmt_name(&template.descriptor.name, color),
                        palette::fmt_description(&template.descriptor.description, color)
                    );
                }
            }
            OutputFormat::Table => {
                let mut table = Table::new(["Name", "Version", "Description"]);
                for template in &templates {
                    table.row([
                        template.descriptor.name.clone(),
                        template.descriptor.version.clone(),
                        template.descriptor.description.clone(),
                    ]);
                }
                println!("{}", table.render());
            }
        }
    }
    diagnostics.print_skipped_summary();
    Ok(())
}

/// `template view`.
fn view(ctx: &Context, store: &TemplateStore, name: &str) -> Result<()> {
    let color = ctx.use_color();
    let template = store.get(name)?;
    let descriptor = &template.descriptor;
    println!(
        "{}",
        palette::fmt_heading(&format!("Template {}", descriptor.name), color)
    );
    println!("Description: {}", descriptor.description);
    println!("Version: {}", descriptor.version);
    println!(
        "Location: {}",
        palette::fmt_path(&display_path(&template.directory), color)
    );
    if !descriptor.variables.is_empty() {
        println!("\n{}", palette::fmt_heading("Variables:", color));
        for (key, spec) in &descriptor.variables {
            let marker = if spec.required { " (required)" } else { "" };
            match &spec.description {
                Some(text) => println!("  {}{marker}: {text}", palette::fmt_name(key, color)),
                None => println!("  {}{marker}", palette::fmt_name(key, color)),
            }
        }
    }
    Ok(())
}

/// Where `template import-github` reads from.
#[derive(Debug)]
struct GithubSource {
    /// Repository to download.
    repo: RepoName,
    /// Sub-directory within the repository.
    path: Option<String>,
    /// Ref to download.
    git_ref: Option<String>,
}

impl GithubSource {
    /// Template name when none is given: the last path segment, else the
    /// repository name.
    fn default_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(|path| path.trim_matches('/').rsplit('/').next())
            .filter(|segment| !segment.is_empty())
            .unwrap_or(&self.repo.repo)
            .to_string()
    }
}

/// `template import-github`.
async fn import_github(
    ctx: &Context,
    store: &TemplateStore,
    source: &GithubSource,
    name: Option<String>,
    description: Option<&str>,
) -> Result<()> {
    let name = name.unwrap_or_else(|| source.default_name());
    let description = description.map_or_else(
        || format!("Imported from {}", source.repo),
        str::to_string,
    );
    let data = ctx
        .client()?
        .zipball(&source.repo, source.git_ref.as_deref(), MAX_ZIPBALL_SIZE)
        .await?;
    let root = archive::archive_root(&data)?;
    let prefix = match &source.path {
        Some(path) => format!("{root}/{}", path.trim_matches('/')),
        None => root,
    };
    let template = store.install(TemplateDescriptor::new(&name, &description), |target| {
        extract_nonempty(&data, &prefix, target)
    })?;
    print_installed(&template, ctx.use_color());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::GithubSource;
    use crate::github::RepoName;

    fn source(path: Option<&str>) -> GithubSource {
        GithubSource {
            repo: RepoName::parse("octo/templates").expect("repo"),
            path: path.map(str::to_string),
            git_ref: None,
        }
    }

    #[test]
    fn default_name_prefers_the_sub_directory() {
        assert_eq!(source(Some("rust/cli/")).default_name(), "cli");
        assert_eq!(source(None).default_name(), "templates");
        assert_eq!(source(Some("/")).default_name(), "templates");
    }
}
