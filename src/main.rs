//! mocra's application entry point.
//! Parses arguments, wires the real collaborators into the template runner
//! and prints what the run did.

use mocra::{
    cli::{get_args, Args},
    command::{CommandRunner, DryRunCommandRunner, ShellCommandRunner},
    config::{get_config, load_config_file},
    error::{default_error_handler, Result},
    file_store::{DiskFileWriter, FileStore, FileWriter},
    prompt::{DialoguerPrompter, Prompter, ScriptedPrompter},
    renderer::{MiniJinjaRenderer, APPLICATION_CONTROLLER},
    runner::TemplateRunner,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .init();

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// # Flow
/// 1. Loads the configuration for the application directory
/// 2. Picks interactive or replayed answers
/// 3. Runs the template against the shell (or a dry-run wrapper)
/// 4. Prints the action log
fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => get_config(&args.app_dir)?,
    };
    let engine = MiniJinjaRenderer::new();

    let prompt: Box<dyn Prompter> = match &args.answers {
        Some(path) => Box::new(ScriptedPrompter::from_file(path)?),
        None => Box::new(DialoguerPrompter::new()),
    };

    let shell = ShellCommandRunner::in_dir(&args.app_dir);

    if args.dry_run {
        let commands = DryRunCommandRunner::new(
            &shell,
            [config.slice_list_command.clone(), config.github_user_command.clone()],
        );
        let mut files = FileStore::new();
        let disk = DiskFileWriter::new(&args.app_dir);
        if let Some(controller) = disk.read_existing(APPLICATION_CONTROLLER)? {
            files = files.with_file(APPLICATION_CONTROLLER, controller);
        }
        execute(&config, &engine, &*prompt, &commands, &mut files, true)?;
        for path in files.paths() {
            println!("would write: '{path}'");
        }
    } else {
        let mut files = DiskFileWriter::new(&args.app_dir);
        execute(&config, &engine, &*prompt, &shell, &mut files, false)?;
    }

    println!("Template completed for {}.", args.app_dir.display());
    Ok(())
}

fn execute(
    config: &mocra::config::TemplateConfig,
    engine: &MiniJinjaRenderer,
    prompt: &dyn Prompter,
    commands: &dyn CommandRunner,
    files: &mut dyn FileWriter,
    dry_run: bool,
) -> Result<()> {
    let mut runner = TemplateRunner::new(config, engine, prompt, commands, files);
    let outcome = runner.run_template();
    print!("{}", runner.log());

    let summary = outcome?;
    if let Some(hint) = summary.registration_hint(dry_run) {
        println!("{hint}");
    }
    println!("Deployed to slice {} ({}).", summary.slice.name, summary.slice.ip_address);
    Ok(())
}
