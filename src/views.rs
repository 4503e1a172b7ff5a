//! Server-side HTML rendering.
//!
//! Templates are small named fragments embedded at compile time. Each [`View`]
//! lists the fragments it is composed from; [`Views::new`] compiles all of them
//! up front so a broken template fails startup rather than a request.

use anyhow::Context;
use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

const FRAGMENTS: &[(&str, &str)] = &[
    ("root.html", include_str!("../templates/root.html")),
    ("head.html", include_str!("../templates/head.html")),
    ("layout.html", include_str!("../templates/layout.html")),
    ("nav.html", include_str!("../templates/nav.html")),
    ("views/today.html", include_str!("../templates/views/today.html")),
    ("views/history.html", include_str!("../templates/views/history.html")),
    ("views/login.html", include_str!("../templates/views/login.html")),
    ("views/register.html", include_str!("../templates/views/register.html")),
    ("components/table.html", include_str!("../templates/components/table.html")),
    ("components/modal.html", include_str!("../templates/components/modal.html")),
];

const BASE: &[&str] = &["root.html", "head.html", "layout.html", "nav.html"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Today,
    History,
    Login,
    Register,
}

impl View {
    pub const ALL: [View; 4] = [View::Today, View::History, View::Login, View::Register];

    fn entry(self) -> &'static str {
        match self {
            View::Today => "views/today.html",
            View::History => "views/history.html",
            View::Login => "views/login.html",
            View::Register => "views/register.html",
        }
    }

    fn components(self) -> &'static [&'static str] {
        match self {
            View::Today => &["components/table.html", "components/modal.html"],
            View::History => &["components/table.html"],
            View::Login | View::Register => &[],
        }
    }

    /// Every fragment needed to render this view.
    pub fn fragments(self) -> impl Iterator<Item = &'static str> {
        BASE.iter()
            .copied()
            .chain(std::iter::once(self.entry()))
            .chain(self.components().iter().copied())
    }

    fn title_suffix(self) -> &'static str {
        match self {
            View::Login => " | Login",
            View::Register => " | Register",
            View::Today | View::History => "",
        }
    }
}

#[derive(Debug, Serialize)]
struct SiteData {
    title: String,
}

#[derive(Serialize)]
struct RenderContext<'a, T: Serialize> {
    site: SiteData,
    signed_in: bool,
    page: &'a T,
}

pub struct Views {
    env: Environment<'static>,
    site_title: String,
}

impl Views {
    pub fn new(site_title: impl Into<String>) -> anyhow::Result<Self> {
        let mut env = Environment::new();
        for &(name, source) in FRAGMENTS {
            env.add_template(name, source)
                .with_context(|| format!("compile template {name}"))?;
        }
        for view in View::ALL {
            for name in view.fragments() {
                env.get_template(name)
                    .with_context(|| format!("{view:?} view is missing template {name}"))?;
            }
        }
        Ok(Self {
            env,
            site_title: site_title.into(),
        })
    }

    pub fn render<T: Serialize>(&self, view: View, signed_in: bool, page: &T) -> anyhow::Result<Html<String>> {
        let ctx = RenderContext {
            site: SiteData {
                title: format!("{}{}", self.site_title, view.title_suffix()),
            },
            signed_in,
            page,
        };
        let html = self
            .env
            .get_template(view.entry())?
            .render(&ctx)
            .with_context(|| format!("render {view:?} view"))?;
        Ok(Html(html))
    }
}
