use crate::config::{self, ConfigEntity};
use crate::error::{Error, Result};
use crate::paths;
use crate::scm::ScmKind;
use crate::template::TemplateSyntax;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Deployment platform for a project. Resolved once at project load;
/// selects default paths, config templates, and post-deploy steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Django,
    Play,
    Static,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Django => "django",
            ProjectKind::Play => "play",
            ProjectKind::Static => "static",
        }
    }

    /// Root directory the project deploys under when not overridden.
    pub fn default_root(&self) -> &'static str {
        match self {
            ProjectKind::Django => "/srv/www/httpd",
            ProjectKind::Play => "/srv/play",
            ProjectKind::Static => "/srv/www/httpd",
        }
    }

    /// Supervisor service name for a project, if the kind runs one.
    pub fn service_name(&self, project_id: &str) -> Option<String> {
        match self {
            ProjectKind::Django => Some(project_id.to_string()),
            ProjectKind::Play => Some(format!("play-{}", project_id)),
            ProjectKind::Static => None,
        }
    }

    /// Settings template rendered inside every checkout of this kind.
    pub fn default_template_pair(&self) -> TemplatePair {
        match self {
            ProjectKind::Django => TemplatePair {
                source: "local_settings.py.template".to_string(),
                dest: "local_settings.py".to_string(),
            },
            ProjectKind::Play => TemplatePair {
                source: "conf/application.conf.template".to_string(),
                dest: "conf/application.conf".to_string(),
            },
            ProjectKind::Static => TemplatePair {
                source: "index.html.template".to_string(),
                dest: "index.html".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmConfig {
    pub kind: ScmKind,
    pub url: String,
    /// Reference checked out when none is passed on the command line.
    /// Falls back to the SCM kind's default (master/trunk).
    #[serde(default)]
    pub default_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    pub host: String,
    pub user: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub identity_file: Option<String>,
}

fn default_port() -> u16 {
    22
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    #[serde(default)]
    pub http: Option<String>,
    #[serde(default)]
    pub https: Option<String>,
}

impl ProxyConfig {
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }
}

/// A single `{source, dest}` template render, relative to the work directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePair {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub dest: String,
}

impl TemplatePair {
    fn validate(&self) -> Result<()> {
        if self.source.is_empty() || self.dest.is_empty() {
            return Err(Error::config_invalid_value(
                "templates.files",
                Some(format!("{{source: {:?}, dest: {:?}}}", self.source, self.dest)),
                "Template file entries need both 'source' and 'dest'",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    /// Placeholder syntax: percent (`%(NAME)s`) or dollar (`$name`).
    #[serde(default)]
    pub syntax: TemplateSyntax,
    /// Ordered settings names required before any render happens.
    #[serde(default)]
    pub vars: Vec<String>,
    /// Extra renders on top of the kind's default settings template.
    #[serde(default)]
    pub files: Vec<TemplatePair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(skip_deserializing, default)]
    pub id: String,
    pub kind: ProjectKind,
    pub scm: ScmConfig,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub sudo_user: Option<String>,
    /// Overrides the kind's default deploy root.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub rsync_exclude: Vec<String>,
    #[serde(default)]
    pub templates: TemplateConfig,
    /// Settings store consumed by the template context builder.
    #[serde(default)]
    pub settings: HashMap<String, String>,
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Overrides the kind-derived supervisor service name.
    #[serde(default)]
    pub service: Option<String>,
    /// Virtualenv path for django projects. Defaults to <projectPath>/env.
    #[serde(default)]
    pub virtualenv: Option<String>,
    /// Requirements file for django projects, relative to the project path.
    #[serde(default)]
    pub requirements: Option<String>,
    /// Play binary for play projects.
    #[serde(default)]
    pub play_bin: Option<String>,
}

impl Project {
    /// Absolute path the project deploys to on the target.
    pub fn project_path(&self) -> String {
        let root = self
            .root
            .as_deref()
            .unwrap_or_else(|| self.kind.default_root());
        format!("{}/{}", root.trim_end_matches('/'), self.id)
    }

    pub fn service_name(&self) -> Option<String> {
        self.service
            .clone()
            .or_else(|| self.kind.service_name(&self.id))
    }

    pub fn virtualenv_path(&self) -> String {
        self.virtualenv
            .clone()
            .unwrap_or_else(|| format!("{}/env", self.project_path()))
    }

    pub fn requirements_file(&self) -> String {
        self.requirements
            .clone()
            .unwrap_or_else(|| "requirements.txt".to_string())
    }

    pub fn play_bin_path(&self) -> String {
        self.play_bin
            .clone()
            .unwrap_or_else(|| "/opt/play/play".to_string())
    }
}

impl ConfigEntity for Project {
    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn config_path(id: &str) -> Result<PathBuf> {
        paths::project(id)
    }
    fn config_dir() -> Result<PathBuf> {
        paths::projects()
    }
    fn not_found_error(id: String, suggestions: Vec<String>) -> Error {
        Error::project_not_found(id, suggestions)
    }
    fn entity_type() -> &'static str {
        "project"
    }

    fn validate(&self) -> Result<()> {
        if self.scm.url.is_empty() {
            return Err(Error::config_invalid_value(
                "scm.url",
                None,
                "Project needs an SCM repository URL",
            ));
        }
        for pair in &self.templates.files {
            pair.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// Core CRUD - Thin wrappers around config module
// ============================================================================

pub fn load(id: &str) -> Result<Project> {
    config::load::<Project>(id)
}

pub fn list() -> Result<Vec<Project>> {
    config::list::<Project>()
}

pub fn list_ids() -> Result<Vec<String>> {
    config::list_ids::<Project>()
}

pub fn save(project: &Project) -> Result<()> {
    config::save(project)
}

pub fn delete(id: &str) -> Result<()> {
    config::delete::<Project>(id)
}

pub fn exists(id: &str) -> bool {
    config::exists::<Project>(id)
}

pub fn create(id: &str, json_spec: &str) -> Result<Project> {
    config::create::<Project>(id, json_spec)
}

pub fn merge(id: &str, json_spec: &str) -> Result<Project> {
    config::merge::<Project>(id, json_spec)
}
