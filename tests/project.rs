use deckhand::project::{self, Project, ProjectKind};
use deckhand::template::TemplateSyntax;

/// CRUD lives in one test: the config dir override is process-wide.
#[test]
fn project_crud_round_trip() {
    let config_dir = tempfile::tempdir().unwrap();
    std::env::set_var("DECKHAND_CONFIG_DIR", config_dir.path());

    let spec = r#"{
        "kind": "play",
        "scm": {"kind": "git", "url": "git@example.com:blog.git"},
        "sudoUser": "deploy",
        "rsyncExclude": [".git"],
        "templates": {
            "syntax": "percent",
            "vars": ["JDBC_URL"],
            "files": [{"source": "conf/logger.xml.template", "dest": "conf/logger.xml"}]
        },
        "settings": {"JDBC_URL": "jdbc:mysql://db1/blog"}
    }"#;

    let created = project::create("blog", spec).unwrap();
    assert_eq!(created.id, "blog");
    assert_eq!(created.kind, ProjectKind::Play);
    assert_eq!(created.sudo_user.as_deref(), Some("deploy"));
    assert_eq!(created.templates.syntax, TemplateSyntax::Percent);
    assert_eq!(created.project_path(), "/srv/play/blog");

    // Creating the same id again is rejected.
    let err = project::create("blog", spec).unwrap_err();
    assert_eq!(err.code, deckhand::ErrorCode::ConfigInvalidValue);

    // Listed and loadable.
    assert_eq!(project::list_ids().unwrap(), vec!["blog".to_string()]);
    let loaded = project::load("blog").unwrap();
    assert_eq!(loaded.scm.url, "git@example.com:blog.git");
    assert_eq!(loaded.templates.vars, vec!["JDBC_URL".to_string()]);

    // Shallow merge replaces top-level keys only.
    let merged = project::merge("blog", r#"{"sudoUser": "www-data"}"#).unwrap();
    assert_eq!(merged.sudo_user.as_deref(), Some("www-data"));
    assert_eq!(merged.scm.url, "git@example.com:blog.git");

    // Unknown projects surface as not-found, with nearby suggestions.
    let err = project::load("blo").unwrap_err();
    assert_eq!(err.code, deckhand::ErrorCode::ProjectNotFound);

    project::delete("blog").unwrap();
    assert!(!project::exists("blog"));
    let err = project::delete("blog").unwrap_err();
    assert_eq!(err.code, deckhand::ErrorCode::ProjectNotFound);
}

#[test]
fn unknown_kind_is_rejected_at_parse_time() {
    let spec = r#"{"kind": "tomcat", "scm": {"kind": "git", "url": "x"}}"#;
    let err = serde_json::from_str::<Project>(spec).unwrap_err();
    assert!(err.to_string().contains("unknown variant"));
}

#[test]
fn camel_case_spec_with_defaults() {
    let spec = r#"{"kind": "static", "scm": {"kind": "svn", "url": "https://svn.example.com/site"}}"#;
    let p: Project = serde_json::from_str(spec).unwrap();
    assert_eq!(p.kind, ProjectKind::Static);
    assert!(p.remote.is_none());
    assert!(p.rsync_exclude.is_empty());
    assert_eq!(p.templates.syntax, TemplateSyntax::Percent);
    assert!(p.settings.is_empty());
    assert!(p.service_name().is_none());
}
