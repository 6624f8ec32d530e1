#![cfg(unix)]

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;

use deckhand::project::{Project, ProjectKind, ProxyConfig, ScmConfig};
use deckhand::runner::Runner;
use deckhand::scm::ScmKind;

fn proxied_project() -> Project {
    Project {
        id: "blog".to_string(),
        kind: ProjectKind::Play,
        scm: ScmConfig {
            kind: ScmKind::Git,
            url: "git@example.com:blog.git".to_string(),
            default_ref: None,
        },
        remote: None,
        sudo_user: Some("deploy".to_string()),
        root: None,
        rsync_exclude: Vec::new(),
        templates: Default::default(),
        settings: HashMap::new(),
        proxy: ProxyConfig {
            http: Some("http://proxy:3128".to_string()),
            https: None,
        },
        service: None,
        virtualenv: None,
        requirements: None,
        play_bin: None,
    }
}

/// A sudo stand-in that clears the environment like env_reset does, so the
/// child only sees variables exported inside the sudo'ed shell.
fn install_fake_sudo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let sudo = dir.path().join("sudo");
    fs::write(
        &sudo,
        "#!/bin/sh\nif [ \"$1\" = \"-u\" ]; then shift 2; fi\nexec env -i PATH=\"$PATH\" \"$@\"\n",
    )
    .unwrap();
    fs::set_permissions(&sudo, fs::Permissions::from_mode(0o755)).unwrap();
    dir
}

#[test]
fn sudo_commands_see_proxy_exports() {
    let bin = install_fake_sudo();
    let path = format!(
        "{}:{}",
        bin.path().display(),
        std::env::var("PATH").unwrap_or_default()
    );
    std::env::set_var("PATH", &path);

    let runner = Runner::for_project(&proxied_project()).unwrap();

    let output = runner.execute("echo plain=$http_proxy");
    assert!(output.success, "{}", output.stderr);
    assert_eq!(output.stdout.trim(), "plain=http://proxy:3128");

    let output = runner.execute_sudo("echo sudoed=$http_proxy");
    assert!(output.success, "{}", output.stderr);
    assert_eq!(output.stdout.trim(), "sudoed=http://proxy:3128");
}
