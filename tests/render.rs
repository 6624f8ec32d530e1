use std::collections::HashMap;
use std::fs;

use deckhand::deploy;
use deckhand::project::{Project, ProjectKind, ScmConfig, TemplatePair};
use deckhand::scm::ScmKind;
use deckhand::template::{self, TemplateSyntax};

fn ctx(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn play_project() -> Project {
    Project {
        id: "blog".to_string(),
        kind: ProjectKind::Play,
        scm: ScmConfig {
            kind: ScmKind::Git,
            url: "git@example.com:blog.git".to_string(),
            default_ref: None,
        },
        remote: None,
        sudo_user: None,
        root: None,
        rsync_exclude: Vec::new(),
        templates: Default::default(),
        settings: Default::default(),
        proxy: Default::default(),
        service: None,
        virtualenv: None,
        requirements: None,
        play_bin: None,
    }
}

#[test]
fn render_file_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("db.conf.template");
    fs::write(&source, "host=%(DB_HOST)s\nport=%(DB_PORT)s\n").unwrap();

    let dest = dir.path().join("out/nested/db.conf");
    template::render_file(
        &source,
        &dest,
        &ctx(&[("DB_HOST", "db1"), ("DB_PORT", "5432")]),
        TemplateSyntax::Percent,
    )
    .unwrap();

    let rendered = fs::read_to_string(&dest).unwrap();
    assert_eq!(rendered, "host=db1\nport=5432\n");
}

#[test]
fn render_file_missing_key_names_the_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("db.conf.template");
    fs::write(&source, "port=%(DB_PORT)s").unwrap();

    let err = template::render_file(
        &source,
        &dir.path().join("db.conf"),
        &HashMap::new(),
        TemplateSyntax::Percent,
    )
    .unwrap_err();

    assert_eq!(err.code, deckhand::ErrorCode::TemplateMissingKey);
    assert!(err.message.contains("DB_PORT"));
    // Nothing is written on failure
    assert!(!dir.path().join("db.conf").exists());
}

#[test]
fn render_tree_preserves_layout() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("config");
    fs::create_dir_all(src.join("etc/app")).unwrap();
    fs::write(src.join("app.conf"), "name=$name").unwrap();
    fs::write(src.join("etc/app/db.conf"), "host=${host}").unwrap();

    let dest = dir.path().join("processed-config");
    let rendered = template::render_tree(
        &src,
        &dest,
        &ctx(&[("name", "blog"), ("host", "db1")]),
        TemplateSyntax::Dollar,
    )
    .unwrap();

    assert_eq!(rendered.len(), 2);
    assert_eq!(
        fs::read_to_string(dest.join("app.conf")).unwrap(),
        "name=blog"
    );
    assert_eq!(
        fs::read_to_string(dest.join("etc/app/db.conf")).unwrap(),
        "host=db1"
    );
}

#[test]
fn project_render_uses_kind_default_template() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("conf")).unwrap();
    fs::write(
        dir.path().join("conf/application.conf.template"),
        "db.url=%(JDBC_URL)s\n",
    )
    .unwrap();

    let project = play_project();
    let rendered = deploy::render_templates(
        &project,
        dir.path(),
        &ctx(&[("JDBC_URL", "jdbc:mysql://db1/blog")]),
    )
    .unwrap();

    assert_eq!(rendered.len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("conf/application.conf")).unwrap(),
        "db.url=jdbc:mysql://db1/blog\n"
    );
}

#[test]
fn project_render_skips_absent_default_but_requires_configured_pairs() {
    let dir = tempfile::tempdir().unwrap();

    // No default template in the checkout: not an error.
    let project = play_project();
    let rendered = deploy::render_templates(&project, dir.path(), &HashMap::new()).unwrap();
    assert!(rendered.is_empty());

    // A configured pair whose source is missing aborts the render.
    let mut project = play_project();
    project.templates.files.push(TemplatePair {
        source: "nginx.conf.template".to_string(),
        dest: "nginx.conf".to_string(),
    });
    let err = deploy::render_templates(&project, dir.path(), &HashMap::new()).unwrap_err();
    assert_eq!(err.code, deckhand::ErrorCode::InternalIoError);
}

#[test]
fn rendered_output_is_stable_under_second_render() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("index.html.template");
    fs::write(&source, "<h1>%(TITLE)s</h1> 100%% organic").unwrap();

    let context = ctx(&[("TITLE", "Hello")]);
    let first = dir.path().join("index.html");
    template::render_file(&source, &first, &context, TemplateSyntax::Percent).unwrap();

    let second = dir.path().join("index2.html");
    template::render_file(&first, &second, &context, TemplateSyntax::Percent).unwrap();

    // The escape collapsed on the first pass; the second pass must not
    // reinterpret the output.
    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        "<h1>Hello</h1> 100% organic"
    );
    assert_eq!(
        fs::read_to_string(&second).unwrap(),
        "<h1>Hello</h1> 100% organic"
    );
}
