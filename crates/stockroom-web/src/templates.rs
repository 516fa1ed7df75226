//! HTML page rendering via `minijinja`.
//!
//! The page templates are compiled into the binary with `include_str!`
//! and registered once at startup. Every page extends `layout.html`,
//! which expects `title`, `user` and `is_admin` in its context; handlers
//! build that part with [`page_context`] and spread their own values on
//! top of it.

use axum::response::Html;
use minijinja::{Environment, Value, context};
use serde::Serialize;
use stockroom_store::thumbnail_name;
use stockroom_types::Role;

use crate::auth::SessionUser;
use crate::error::WebError;

/// Templates bundled with the crate, by registration name.
const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("item_form.html", include_str!("../templates/item_form.html")),
    ("shelves.html", include_str!("../templates/shelves.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("users.html", include_str!("../templates/users.html")),
];

/// Compiled page templates.
#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Compile all bundled templates.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Template`] if a template has a syntax error.
    pub fn new() -> Result<Self, WebError> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| WebError::Template(format!("{name}: {e}")))?;
        }
        env.add_filter("thumbnail", |name: String| thumbnail_name(&name));
        Ok(Self { env })
    }

    /// Render the template `name` with `ctx`.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, WebError> {
        let template = self.env.get_template(name)?;
        Ok(Html(template.render(ctx)?))
    }
}

/// Context every page shares: the site title and the signed-in user.
pub fn page_context(title: &str, user: Option<&SessionUser>) -> Value {
    context! {
        title => title,
        user => user,
        is_admin => user.is_some_and(|u| u.role == Role::Admin),
    }
}
