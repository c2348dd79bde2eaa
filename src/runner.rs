//! The template workflow.
//!
//! [`TemplateRunner`] asks its questions through a [`Prompter`], talks to the
//! outside world through a [`CommandRunner`], writes through a [`FileWriter`]
//! and records every side effect in its [`ActionLog`]. The steps run in a
//! fixed order:
//!
//! 1. choose the authentication strategy
//! 2. choose a slice from `slicehost-slice list`
//! 3. choose the repository visibility
//! 4. generate the authentication files
//! 5. point a DNS CNAME at the slice
//! 6. create the GitHub repository
//! 7. write `config/deploy.rb`
//! 8. `cap deploy:setup` and `cap deploy:cold`
//!
//! A failing step aborts the run. Nothing is rolled back: the log and the
//! files written so far stay as they are.

use crate::action_log::ActionLog;
use crate::command::CommandRunner;
use crate::config::TemplateConfig;
use crate::error::{Error, Result};
use crate::file_store::FileWriter;
use crate::parser::{
    parse_config_value, parse_oauth_registration, parse_slice_list, OAuthCredential, Slice,
};
use crate::prompt::Prompter;
use crate::renderer::{
    TemplateRenderer, APPLICATION_CONTROLLER, DEPLOY_RB, MAILER_INITIALIZER, MAILER_YML,
    STOCK_APPLICATION_CONTROLLER, TWITTER_AUTH_YML, USERS_NEW_VIEW,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

pub const AUTHENTICATED_SYSTEM_MIXIN: &str = "  include AuthenticatedSystem";
pub const DEPLOY_SETUP_COMMAND: &str = "cap deploy:setup";
pub const DEPLOY_COLD_COMMAND: &str = "cap deploy:cold";
pub const RESTFUL_AUTHENTICATION_GENERATOR: &str =
    "script/generate authenticated user sessions --include-activation";
pub const TWITTER_AUTH_GENERATOR: &str = "script/generate twitter_auth";

/// Declares a closed set of answers that round-trips through its prompt label.
macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn labels() -> Vec<String> {
                Self::ALL.iter().map(|v| v.as_str().to_string()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s.trim())
                    .ok_or_else(|| {
                        Error::PromptError(format!(
                            "'{}' is not one of: {}",
                            s,
                            Self::labels().join(", ")
                        ))
                    })
            }
        }
    };
}

choice_enum!(
    /// How users of the generated application sign in.
    AuthStrategy {
        None => "none",
        RestfulAuthentication => "restful_authentication",
        TwitterAuth => "twitter_auth",
    }
);

choice_enum!(
    RepoVisibility {
        Public => "public",
        Private => "private",
    }
);

choice_enum!(
    /// Access level requested when registering the Twitter application.
    TwitterAccess {
        ReadOnly => "read-only",
        ReadWrite => "read-write",
    }
);

/// Decisions and lookups made during a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub auth: AuthStrategy,
    pub slice: Slice,
    pub visibility: RepoVisibility,
    pub github_user: String,
    /// Set only when the twitter_auth strategy was chosen
    pub oauth: Option<OAuthCredential>,
}

impl RunSummary {
    /// Manual follow-up for a Twitter registration that fell back to the
    /// placeholder keys. A dry run never registers, so it gets no hint.
    pub fn registration_hint(&self, dry_run: bool) -> Option<String> {
        let oauth = self.oauth.as_ref().filter(|oauth| oauth.is_placeholder())?;
        if dry_run {
            return None;
        }
        Some(format!(
            "Twitter registration failed; set {} and {} by hand.",
            oauth.key, oauth.secret
        ))
    }
}

pub struct TemplateRunner<'a> {
    config: &'a TemplateConfig,
    engine: &'a dyn TemplateRenderer,
    prompt: &'a dyn Prompter,
    commands: &'a dyn CommandRunner,
    files: &'a mut dyn FileWriter,
    log: ActionLog,
}

impl<'a> TemplateRunner<'a> {
    pub fn new(
        config: &'a TemplateConfig,
        engine: &'a dyn TemplateRenderer,
        prompt: &'a dyn Prompter,
        commands: &'a dyn CommandRunner,
        files: &'a mut dyn FileWriter,
    ) -> Self {
        Self { config, engine, prompt, commands, files, log: ActionLog::new() }
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    pub fn full_log(&self) -> String {
        self.log.full_log()
    }

    pub fn into_log(self) -> ActionLog {
        self.log
    }

    /// Runs the whole workflow.
    pub fn run_template(&mut self) -> Result<RunSummary> {
        let auth = self.choose_auth_strategy()?;
        let slice = self.choose_slice()?;
        let visibility = self.choose_repo_visibility()?;
        info!(
            "Provisioning '{}' with auth={auth}, slice={}, repo={visibility}",
            self.config.app_name, slice.name
        );

        let oauth = match auth {
            AuthStrategy::None => {
                debug!("No authentication requested, skipping auth files");
                None
            }
            AuthStrategy::RestfulAuthentication => {
                self.install_restful_authentication()?;
                None
            }
            AuthStrategy::TwitterAuth => Some(self.install_twitter_auth()?),
        };

        self.register_dns(&slice)?;
        let github_user = self.create_source_repository(visibility)?;
        self.generate_deploy_config(&slice, &github_user, visibility)?;
        self.deploy()?;

        Ok(RunSummary { auth, slice, visibility, github_user, oauth })
    }

    pub fn choose_auth_strategy(&mut self) -> Result<AuthStrategy> {
        let answer = self.prompt.choose("Authentication?", &AuthStrategy::labels())?;
        answer.parse()
    }

    /// Names of the slices currently reported by the provider.
    pub fn slice_names(&mut self) -> Result<Vec<String>> {
        Ok(self.list_slices()?.into_iter().map(|s| s.name).collect())
    }

    pub fn choose_slice(&mut self) -> Result<Slice> {
        let slices = self.list_slices()?;
        if slices.is_empty() {
            return Err(Error::NoSlicesError { command: self.config.slice_list_command.clone() });
        }

        let names: Vec<String> = slices.iter().map(|s| s.name.clone()).collect();
        let answer = self.prompt.choose("Which slice?", &names)?;
        let answer = answer.trim();

        slices.into_iter().find(|s| s.name == answer).ok_or_else(|| Error::SliceNotFoundError {
            name: answer.to_string(),
            available: names.join(", "),
        })
    }

    pub fn choose_repo_visibility(&mut self) -> Result<RepoVisibility> {
        let answer = self.prompt.choose("GitHub repository?", &RepoVisibility::labels())?;
        answer.parse()
    }

    fn list_slices(&mut self) -> Result<Vec<Slice>> {
        let command = self.config.slice_list_command.clone();
        let output = self.commands.run(&command)?;
        Ok(parse_slice_list(&output))
    }

    fn install_restful_authentication(&mut self) -> Result<()> {
        self.execute(RESTFUL_AUTHENTICATION_GENERATOR)?;

        let context = self.base_context();
        self.write_rendered(MAILER_YML, &context)?;
        self.write_rendered(MAILER_INITIALIZER, &context)?;
        self.include_authenticated_system()?;
        self.write_rendered(USERS_NEW_VIEW, &context)
    }

    /// Adds the AuthenticatedSystem mixin below the controller's class line.
    fn include_authenticated_system(&mut self) -> Result<()> {
        let current = self
            .files
            .read_existing(APPLICATION_CONTROLLER)?
            .unwrap_or_else(|| STOCK_APPLICATION_CONTROLLER.to_string());

        if current.lines().any(|line| line.trim() == AUTHENTICATED_SYSTEM_MIXIN.trim_start()) {
            debug!("{APPLICATION_CONTROLLER} already includes AuthenticatedSystem");
            return Ok(());
        }

        let mut inserted = false;
        let mut updated = String::with_capacity(current.len() + AUTHENTICATED_SYSTEM_MIXIN.len());
        for line in current.split_inclusive('\n') {
            updated.push_str(line);
            if !inserted && is_application_controller_class(line) {
                if !line.ends_with('\n') {
                    updated.push('\n');
                }
                updated.push_str(AUTHENTICATED_SYSTEM_MIXIN);
                updated.push('\n');
                inserted = true;
            }
        }

        if !inserted {
            return Err(Error::TemplateError(format!(
                "no ApplicationController class found in {APPLICATION_CONTROLLER}"
            )));
        }
        self.write_file(APPLICATION_CONTROLLER, &updated)
    }

    fn install_twitter_auth(&mut self) -> Result<OAuthCredential> {
        let username = self.prompt.input("Twitter username?")?.trim().to_string();
        validate_twitter_username(&username)?;
        let access: TwitterAccess =
            self.prompt.choose("Twitter access?", &TwitterAccess::labels())?.parse()?;

        let command = self.register_oauth_command(&username, access)?;
        let output = self.execute(&command)?;
        let credential = parse_oauth_registration(&output);

        if credential.is_placeholder() {
            warn!("Twitter registration failed, not writing {TWITTER_AUTH_YML}");
            return Ok(credential);
        }

        self.execute(TWITTER_AUTH_GENERATOR)?;
        let mut context = self.base_context();
        context["oauth"] = serde_json::json!(credential);
        self.write_rendered(TWITTER_AUTH_YML, &context)?;
        Ok(credential)
    }

    /// `twitter register_oauth` command line for this application.
    ///
    /// The username goes in verbatim and must pass
    /// [`validate_twitter_username`]; config values are shell-quoted.
    pub fn register_oauth_command(&self, username: &str, access: TwitterAccess) -> Result<String> {
        validate_twitter_username(username)?;
        let mut command = format!(
            "twitter register_oauth {username} {} {} {} organization={} organization_url={}",
            single_quoted(&self.config.app_title()),
            shell_words::quote(&self.config.app_url()),
            single_quoted(&self.config.description),
            single_quoted(&self.config.organization),
            shell_words::quote(&self.config.organization_url),
        );
        if access == TwitterAccess::ReadWrite {
            command.push_str(" --readwrite");
        }
        Ok(command)
    }

    fn register_dns(&mut self, slice: &Slice) -> Result<()> {
        let command = format!(
            "slicehost-dns add_cname {} {} {}",
            self.config.domain, self.config.app_name, slice.name
        );
        self.execute(&command).map(|_| ())
    }

    fn create_source_repository(&mut self, visibility: RepoVisibility) -> Result<String> {
        let lookup = self.config.github_user_command.clone();
        let output = self.commands.run(&lookup)?;
        let github_user = parse_config_value(&output)
            .ok_or(Error::MissingConfigValueError { command: lookup })?;
        debug!("GitHub user is '{github_user}'");

        let command = match visibility {
            RepoVisibility::Public => "github create-from-local".to_string(),
            RepoVisibility::Private => "github create-from-local --private".to_string(),
        };
        self.execute(&command)?;
        Ok(github_user)
    }

    fn generate_deploy_config(
        &mut self,
        slice: &Slice,
        github_user: &str,
        visibility: RepoVisibility,
    ) -> Result<()> {
        let mut context = self.base_context();
        context["slice"] = serde_json::json!(slice);
        context["github_user"] = serde_json::json!(github_user);
        context["repository"] =
            serde_json::json!(repository_url(github_user, &self.config.app_name, visibility));
        self.write_rendered(DEPLOY_RB, &context)
    }

    fn deploy(&mut self) -> Result<()> {
        self.execute(DEPLOY_SETUP_COMMAND)?;
        self.execute(DEPLOY_COLD_COMMAND)?;
        Ok(())
    }

    /// Logs and runs a side-effecting command.
    fn execute(&mut self, command: &str) -> Result<String> {
        self.log.executing(command);
        self.commands.run(command)
    }

    fn write_rendered(&mut self, path: &str, context: &serde_json::Value) -> Result<()> {
        let content = self.engine.render_file(path, context)?;
        self.write_file(path, &content)
    }

    fn write_file(&mut self, path: &str, content: &str) -> Result<()> {
        self.files.write(path, content)?;
        self.log.file(path);
        Ok(())
    }

    fn base_context(&self) -> serde_json::Value {
        serde_json::json!({
            "app": {
                "name": self.config.app_name,
                "title": self.config.app_title(),
                "host": self.config.app_host(),
                "url": self.config.app_url(),
            },
            "domain": self.config.domain,
        })
    }
}

/// Clone URL Capistrano deploys from.
pub fn repository_url(github_user: &str, app_name: &str, visibility: RepoVisibility) -> String {
    match visibility {
        RepoVisibility::Public => format!("git://github.com/{github_user}/{app_name}.git"),
        RepoVisibility::Private => format!("git@github.com:{github_user}/{app_name}.git"),
    }
}

/// Accepts Twitter screen names: letters, digits, `_`, `-` and `.`.
pub fn validate_twitter_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::PromptError("Twitter username must not be blank".to_string()));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')) {
        return Err(Error::PromptError(format!("Invalid Twitter username '{username}'")));
    }
    Ok(())
}

// Always wrapped in single quotes, even when the shell would not need them.
fn single_quoted(value: &str) -> String {
    match shell_words::quote(value) {
        Cow::Borrowed(plain) => format!("'{plain}'"),
        Cow::Owned(quoted) => quoted,
    }
}

fn is_application_controller_class(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    tokens.next() == Some("class") && tokens.next() == Some("ApplicationController")
}
