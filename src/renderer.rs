//! Rendering of the files the template generates.
//! Sources are embedded in the binary and rendered with MiniJinja.

use crate::error::{Error, Result};
use minijinja::Environment;

pub const DEPLOY_RB: &str = "config/deploy.rb";
pub const TWITTER_AUTH_YML: &str = "config/twitter_auth.yml";
pub const MAILER_YML: &str = "config/mailer.yml";
pub const MAILER_INITIALIZER: &str = "config/initializers/mailer.rb";
pub const APPLICATION_CONTROLLER: &str = "app/controllers/application_controller.rb";
pub const USERS_NEW_VIEW: &str = "app/views/users/new.html.erb";

/// Generated application file paths paired with their template source.
const TEMPLATES: [(&str, &str); 5] = [
    (DEPLOY_RB, include_str!("templates/deploy.rb.j2")),
    (TWITTER_AUTH_YML, include_str!("templates/twitter_auth.yml.j2")),
    (MAILER_YML, include_str!("templates/mailer.yml.j2")),
    (MAILER_INITIALIZER, include_str!("templates/mailer.rb.j2")),
    (USERS_NEW_VIEW, include_str!("templates/new.html.erb.j2")),
];

/// Body of a freshly generated Rails application controller.
pub const STOCK_APPLICATION_CONTROLLER: &str = "\
# Filters added to this controller apply to all controllers in the application.
# Likewise, all the methods added will be available for all controllers.

class ApplicationController < ActionController::Base
  helper :all # include all helpers, all the time
  protect_from_forgery # See ActionController::RequestForgeryProtection for details
end
";

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders an ad-hoc template string with the given context.
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;

    /// Renders the embedded template generating `path`.
    fn render_file(&self, path: &str, context: &serde_json::Value) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer with all embedded templates registered under the
    /// path of the file they generate.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_trim_blocks(true);
        for (path, source) in TEMPLATES {
            env.add_template(path, source).expect("embedded template must compile");
        }
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        let mut env = self.env.clone();
        env.add_template_owned("temp".to_string(), template.to_string())
            .map_err(Error::MinijinjaError)?;

        let tmpl = env.get_template("temp").map_err(Error::MinijinjaError)?;

        tmpl.render(context).map_err(Error::MinijinjaError)
    }

    fn render_file(&self, path: &str, context: &serde_json::Value) -> Result<String> {
        let tmpl = self
            .env
            .get_template(path)
            .map_err(|_| Error::TemplateError(format!("no template generates '{path}'")))?;
        tmpl.render(context).map_err(Error::MinijinjaError)
    }
}
