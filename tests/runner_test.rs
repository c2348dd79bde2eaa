use mocra::command::CommandRegistry;
use mocra::config::TemplateConfig;
use mocra::error::{Error, Result};
use mocra::file_store::FileStore;
use mocra::prompt::ScriptedPrompter;
use mocra::renderer::MiniJinjaRenderer;
use mocra::runner::{
    repository_url, validate_twitter_username, AuthStrategy, RepoVisibility, RunSummary,
    TemplateRunner, TwitterAccess,
};
use mocra::action_log::ActionLog;

const SLICES: &str = "+ mocra-primary (123.123.123.123)\n+ mocra-secondary (65.65.65.65)\n";

const REGISTERED: &str = "Nice! You've registered your application successfully.\n\
                          Consumer key:    CONSUMERKEY\n\
                          Consumer secret: CONSUMERSECRET\n";

const REJECTED: &str = "Unable to register this application. Check your registration settings.\n\
                        * Name has already been taken\n";

const REGISTER_READ_ONLY: &str = "twitter register_oauth drnic 'Rails Templates' \
    http://rails-templates.mocra.com 'This is a cool app' organization='Mocra' \
    organization_url=http://mocra.com";

const REGISTER_READ_WRITE: &str = "twitter register_oauth drnic 'Rails Templates' \
    http://rails-templates.mocra.com 'This is a cool app' organization='Mocra' \
    organization_url=http://mocra.com --readwrite";

const CONTROLLER: &str = "class ApplicationController < ActionController::Base\n  helper :all\nend\n";

fn registry() -> CommandRegistry {
    CommandRegistry::new()
        .on_command("slicehost-slice list", SLICES)
        .on_command("git config --get github.user", "github_person\n")
}

struct Outcome {
    result: Result<RunSummary>,
    log: ActionLog,
    files: FileStore,
    commands: Vec<String>,
}

impl Outcome {
    fn full_log(&self) -> String {
        self.log.full_log()
    }

    fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path)
    }
}

fn run_with(commands: CommandRegistry, answers: &[&str], files: FileStore) -> Outcome {
    let config = TemplateConfig::default();
    let engine = MiniJinjaRenderer::new();
    let prompt = ScriptedPrompter::new(answers.iter().copied());
    let mut files = files;

    let (result, log) = {
        let mut runner = TemplateRunner::new(&config, &engine, &prompt, &commands, &mut files);
        let result = runner.run_template();
        (result, runner.into_log())
    };

    Outcome { result, log, files, commands: commands.history() }
}

fn run(commands: CommandRegistry, answers: &[&str]) -> Outcome {
    run_with(commands, answers, FileStore::new().with_file(
        "app/controllers/application_controller.rb",
        CONTROLLER,
    ))
}

fn assert_deployed(outcome: &Outcome) {
    let log = outcome.full_log();
    assert!(log.contains("executing  slicehost-dns add_cname mocra.com rails-templates mocra-primary"));
    assert!(log.contains("file  config/deploy.rb"));

    let setup = outcome.log.position("executing  cap deploy:setup").unwrap();
    let cold = outcome.log.position("executing  cap deploy:cold").unwrap();
    assert!(setup < cold);
    assert_eq!(cold, outcome.log.len() - 1);
}

#[test]
fn test_slice_names() {
    let config = TemplateConfig::default();
    let engine = MiniJinjaRenderer::new();
    let prompt = ScriptedPrompter::new(Vec::<String>::new());
    let commands = registry();
    let mut files = FileStore::new();

    let mut runner = TemplateRunner::new(&config, &engine, &prompt, &commands, &mut files);
    assert_eq!(runner.slice_names().unwrap(), vec!["mocra-primary", "mocra-secondary"]);
    assert!(runner.log().is_empty());
}

#[test_log::test]
fn test_no_auth_public_repository() {
    let outcome = run(registry(), &["none", "mocra-primary", "public"]);
    let summary = outcome.result.as_ref().unwrap();

    assert_eq!(summary.auth, AuthStrategy::None);
    assert_eq!(summary.visibility, RepoVisibility::Public);
    assert_eq!(summary.slice.ip_address, "123.123.123.123");
    assert_eq!(summary.github_user, "github_person");
    assert!(summary.oauth.is_none());

    assert_deployed(&outcome);
    let log = outcome.full_log();
    assert!(!log.contains("executing  twitter register_oauth"));
    assert!(log.contains("executing  github create-from-local"));
    assert!(!log.contains("executing  github create-from-local --private"));

    assert!(outcome.file("config/twitter_auth.yml").is_none());
    assert!(outcome.file("config/initializers/mailer.rb").is_none());
    assert!(outcome.file("config/mailer.yml").is_none());
    assert!(outcome.file("app/views/users/new.html.erb").is_none());
    assert_eq!(outcome.file("app/controllers/application_controller.rb"), Some(CONTROLLER));

    let deploy = outcome.file("config/deploy.rb").unwrap();
    assert!(deploy.contains("git://github.com/github_person/"));
    assert!(deploy.contains("role :app, \"123.123.123.123\""));
}

#[test]
fn test_no_auth_log_is_exactly_the_workflow() {
    let outcome = run(registry(), &["none", "mocra-secondary", "public"]);
    outcome.result.as_ref().unwrap();

    assert_eq!(
        outcome.log.entries(),
        &[
            "executing  slicehost-dns add_cname mocra.com rails-templates mocra-secondary",
            "executing  github create-from-local",
            "file  config/deploy.rb",
            "executing  cap deploy:setup",
            "executing  cap deploy:cold",
        ]
    );
    assert_eq!(
        outcome.commands,
        vec![
            "slicehost-slice list",
            "slicehost-dns add_cname mocra.com rails-templates mocra-secondary",
            "git config --get github.user",
            "github create-from-local",
            "cap deploy:setup",
            "cap deploy:cold",
        ]
    );
}

#[test]
fn test_restful_authentication_private_repository() {
    let outcome = run(registry(), &["restful_authentication", "mocra-primary", "private"]);
    outcome.result.as_ref().unwrap();

    assert_deployed(&outcome);
    let log = outcome.full_log();
    assert!(!log.contains("executing  twitter register_oauth"));
    assert!(log.contains("executing  github create-from-local --private"));
    assert!(log.contains("file  config/mailer.yml"));
    assert!(log.contains("file  app/controllers/application_controller.rb"));

    assert!(outcome.file("config/twitter_auth.yml").is_none());
    assert!(outcome.file("config/initializers/mailer.rb").is_some());
    assert!(outcome.file("config/mailer.yml").is_some());
    assert!(outcome.file("app/views/users/new.html.erb").unwrap().contains("mailer.yml"));

    let controller = outcome.file("app/controllers/application_controller.rb").unwrap();
    assert!(controller.lines().any(|l| l == "  include AuthenticatedSystem"));
    assert_eq!(
        controller,
        "class ApplicationController < ActionController::Base\n  include AuthenticatedSystem\n  helper :all\nend\n"
    );

    let deploy = outcome.file("config/deploy.rb").unwrap();
    assert!(deploy.contains("git@github.com:github_person/"));
}

#[test]
fn test_restful_authentication_without_existing_controller() {
    let outcome = run_with(
        registry(),
        &["restful_authentication", "mocra-primary", "public"],
        FileStore::new(),
    );
    outcome.result.as_ref().unwrap();

    let controller = outcome.file("app/controllers/application_controller.rb").unwrap();
    assert!(controller.contains("class ApplicationController < ActionController::Base\n  include AuthenticatedSystem\n"));
}

#[test]
fn test_restful_authentication_does_not_duplicate_mixin() {
    let existing = "class ApplicationController < ActionController::Base\n  include AuthenticatedSystem\nend\n";
    let outcome = run_with(
        registry(),
        &["restful_authentication", "mocra-primary", "public"],
        FileStore::new().with_file("app/controllers/application_controller.rb", existing),
    );
    outcome.result.as_ref().unwrap();

    assert_eq!(outcome.file("app/controllers/application_controller.rb"), Some(existing));
    assert!(!outcome.full_log().contains("file  app/controllers/application_controller.rb"));
}

#[test]
fn test_restful_authentication_does_not_duplicate_indented_mixin() {
    for existing in [
        "class ApplicationController < ActionController::Base\n    include AuthenticatedSystem\nend\n",
        "class ApplicationController < ActionController::Base\n\tinclude AuthenticatedSystem\nend\n",
    ] {
        let outcome = run_with(
            registry(),
            &["restful_authentication", "mocra-primary", "public"],
            FileStore::new().with_file("app/controllers/application_controller.rb", existing),
        );
        outcome.result.as_ref().unwrap();

        assert_eq!(outcome.file("app/controllers/application_controller.rb"), Some(existing));
        assert!(!outcome.full_log().contains("file  app/controllers/application_controller.rb"));
    }
}

#[test]
fn test_twitter_auth_read_write() {
    let commands = registry().on_command(REGISTER_READ_WRITE, REGISTERED);
    let outcome = run(commands, &["twitter_auth", "mocra-primary", "public", "drnic", "read-write"]);
    let summary = outcome.result.as_ref().unwrap();

    assert_deployed(&outcome);
    assert!(outcome.full_log().contains(&format!("executing  {REGISTER_READ_WRITE}")));
    assert!(outcome.full_log().contains("executing  script/generate twitter_auth"));

    let oauth = summary.oauth.as_ref().unwrap();
    assert_eq!(oauth.key, "CONSUMERKEY");
    assert_eq!(oauth.secret, "CONSUMERSECRET");

    let twitter = outcome.file("config/twitter_auth.yml").unwrap();
    assert!(twitter.contains("oauth_consumer_key: CONSUMERKEY"));
    assert!(twitter.contains("oauth_consumer_secret: CONSUMERSECRET"));
    assert!(outcome.file("config/mailer.yml").is_none());
    assert!(summary.registration_hint(false).is_none());
}

#[test]
fn test_twitter_auth_read_only() {
    let commands = registry().on_command(REGISTER_READ_ONLY, REGISTERED);
    let outcome = run(commands, &["twitter_auth", "mocra-primary", "public", "drnic", "read-only"]);
    outcome.result.as_ref().unwrap();

    let expected = format!("executing  {REGISTER_READ_ONLY}");
    assert!(outcome.log.contains(&expected));
    assert!(!outcome.full_log().contains("--readwrite"));
    assert!(outcome.file("config/twitter_auth.yml").is_some());
}

#[test_log::test]
fn test_twitter_auth_rejected_registration() {
    let commands = registry().on_command(REGISTER_READ_ONLY, REJECTED);
    let outcome = run(commands, &["twitter_auth", "mocra-primary", "public", "drnic", "read-only"]);
    let summary = outcome.result.as_ref().unwrap();

    assert!(summary.oauth.as_ref().unwrap().is_placeholder());
    assert!(outcome.full_log().contains(&format!("executing  {REGISTER_READ_ONLY}")));
    assert!(!outcome.full_log().contains("script/generate twitter_auth"));
    assert!(outcome.file("config/twitter_auth.yml").is_none());
    assert_deployed(&outcome);

    assert_eq!(
        summary.registration_hint(false).as_deref(),
        Some("Twitter registration failed; set TWITTER_CONSUMERKEY and TWITTER_CONSUMERSECRET by hand.")
    );
    assert!(summary.registration_hint(true).is_none());
}

#[test]
fn test_unknown_slice_aborts_before_side_effects() {
    let outcome = run(registry(), &["none", "mocra-tertiary", "public"]);

    match &outcome.result {
        Err(Error::SliceNotFoundError { name, available }) => {
            assert_eq!(name, "mocra-tertiary");
            assert_eq!(available, "mocra-primary, mocra-secondary");
        }
        other => panic!("Expected SliceNotFoundError, got {other:?}"),
    }
    assert!(outcome.log.is_empty());
    assert!(outcome.file("config/deploy.rb").is_none());
}

#[test]
fn test_no_slices_aborts() {
    let commands = CommandRegistry::new().on_command("slicehost-slice list", "No slices.\n");
    let outcome = run(commands, &["none", "mocra-primary", "public"]);

    assert!(matches!(outcome.result, Err(Error::NoSlicesError { .. })));
    assert!(outcome.log.is_empty());
}

#[test]
fn test_missing_github_user_keeps_partial_log() {
    let commands = CommandRegistry::new().on_command("slicehost-slice list", SLICES);
    let outcome = run(commands, &["restful_authentication", "mocra-primary", "public"]);

    assert!(matches!(outcome.result, Err(Error::MissingConfigValueError { .. })));
    assert!(outcome.file("config/mailer.yml").is_some());
    assert!(outcome.full_log().contains("executing  slicehost-dns add_cname"));
    assert!(!outcome.full_log().contains("github create-from-local"));
    assert!(outcome.file("config/deploy.rb").is_none());
}

#[test]
fn test_failing_command_is_logged_and_aborts() {
    let commands = registry().fail_on("cap deploy:setup", "exit status: 1");
    let outcome = run(commands, &["none", "mocra-primary", "public"]);

    assert!(matches!(outcome.result, Err(Error::CommandExecutionError { .. })));
    assert!(outcome.log.contains("executing  cap deploy:setup"));
    assert!(!outcome.full_log().contains("cap deploy:cold"));
    assert!(outcome.file("config/deploy.rb").is_some());
}

#[test]
fn test_invalid_auth_answer() {
    let outcome = run(registry(), &["oauth2"]);
    assert!(matches!(outcome.result, Err(Error::PromptError(_))));
    assert!(outcome.commands.is_empty());
}

#[test]
fn test_register_oauth_command() {
    let config = TemplateConfig::default();
    let engine = MiniJinjaRenderer::new();
    let prompt = ScriptedPrompter::new(Vec::<String>::new());
    let commands = CommandRegistry::new();
    let mut files = FileStore::new();
    let runner = TemplateRunner::new(&config, &engine, &prompt, &commands, &mut files);

    assert_eq!(runner.register_oauth_command("drnic", TwitterAccess::ReadOnly).unwrap(), REGISTER_READ_ONLY);
    assert_eq!(runner.register_oauth_command("drnic", TwitterAccess::ReadWrite).unwrap(), REGISTER_READ_WRITE);
}

#[test]
fn test_register_oauth_command_rejects_shell_metacharacters() {
    let config = TemplateConfig::default();
    let engine = MiniJinjaRenderer::new();
    let prompt = ScriptedPrompter::new(Vec::<String>::new());
    let commands = CommandRegistry::new();
    let mut files = FileStore::new();
    let runner = TemplateRunner::new(&config, &engine, &prompt, &commands, &mut files);

    for username in ["drnic; echo INJECTED", "dr nic", "$(whoami)", "drnic`id`", ""] {
        assert!(
            matches!(runner.register_oauth_command(username, TwitterAccess::ReadOnly), Err(Error::PromptError(_))),
            "accepted {username:?}"
        );
    }
    assert!(validate_twitter_username("dr_nic-2.0").is_ok());
}

#[test]
fn test_register_oauth_command_quotes_config_values() {
    let config = TemplateConfig {
        description: "Bob's cool app".to_string(),
        organization: "Mocra & Co".to_string(),
        ..TemplateConfig::default()
    };
    let engine = MiniJinjaRenderer::new();
    let prompt = ScriptedPrompter::new(Vec::<String>::new());
    let commands = CommandRegistry::new();
    let mut files = FileStore::new();
    let runner = TemplateRunner::new(&config, &engine, &prompt, &commands, &mut files);

    let command = runner.register_oauth_command("drnic", TwitterAccess::ReadOnly).unwrap();
    assert_eq!(
        command,
        "twitter register_oauth drnic 'Rails Templates' http://rails-templates.mocra.com \
         'Bob'\\''s cool app' organization='Mocra & Co' organization_url=http://mocra.com"
    );
}

#[test]
fn test_twitter_auth_injected_username_runs_nothing() {
    let outcome = run(
        registry(),
        &["twitter_auth", "mocra-primary", "public", "drnic; echo INJECTED", "read-only"],
    );

    assert!(matches!(outcome.result, Err(Error::PromptError(_))));
    assert!(!outcome.full_log().contains("INJECTED"));
    assert!(outcome.commands.iter().all(|c| !c.contains("twitter register_oauth")));
}

#[test]
fn test_twitter_auth_blank_username() {
    let outcome = run(registry(), &["twitter_auth", "mocra-primary", "public", "  ", "read-only"]);

    match &outcome.result {
        Err(Error::PromptError(message)) => assert!(message.contains("blank")),
        other => panic!("Expected PromptError, got {other:?}"),
    }
    assert!(!outcome.full_log().contains("twitter register_oauth"));
    assert!(outcome.file("config/twitter_auth.yml").is_none());
}

#[test]
fn test_choice_labels_round_trip() {
    for auth in AuthStrategy::ALL {
        assert_eq!(auth.as_str().parse::<AuthStrategy>().unwrap(), *auth);
    }
    assert_eq!(RepoVisibility::labels(), vec!["public", "private"]);
    assert_eq!("read-write".parse::<TwitterAccess>().unwrap(), TwitterAccess::ReadWrite);
    assert!("write-only".parse::<TwitterAccess>().is_err());
}

#[test]
fn test_repository_url() {
    assert_eq!(
        repository_url("github_person", "blog", RepoVisibility::Public),
        "git://github.com/github_person/blog.git"
    );
    assert_eq!(
        repository_url("github_person", "blog", RepoVisibility::Private),
        "git@github.com:github_person/blog.git"
    );
}
