use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::tempdir;

use gislack::load_config::{load_config, load_optional, locate, require_slack_token};
use gislack::options::GistArgs;
use gislack_core::config::CONFIG_DIR_ENV;

#[test]
#[serial]
fn cfgdirectory_option_beats_env_and_workdir() {
    let from_option = tempdir().unwrap();
    let from_env = tempdir().unwrap();
    let workdir = tempdir().unwrap();
    env::set_var(CONFIG_DIR_ENV, from_env.path());

    let args = GistArgs {
        cfgdirectory: Some(from_option.path().display().to_string()),
        workdir: Some(workdir.path().display().to_string()),
        ..Default::default()
    };
    let location = locate(&args).expect("location resolves");
    assert_eq!(location.file, from_option.path().join("gislack.cfg"));
    assert_eq!(location.workdir, workdir.path());

    let args = GistArgs {
        workdir: Some(workdir.path().display().to_string()),
        ..Default::default()
    };
    assert_eq!(
        locate(&args).unwrap().file,
        from_env.path().join("gislack.cfg")
    );

    env::remove_var(CONFIG_DIR_ENV);
    assert_eq!(
        locate(&args).unwrap().file,
        workdir.path().join("gislack.cfg")
    );
}

#[test]
#[serial]
fn load_reports_missing_and_reads_tokens() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gislack.cfg");
    assert!(load_optional(&path).unwrap().is_none());
    assert!(load_config(&path).is_err());

    write(
        &path,
        "{\n\t\"slack\": {\n\t\t\"SlackAccesstoken\": {\n\t\t\t\"access_token\": \"xoxp-7\"\n\t\t}\n\t}\n}",
    )
    .unwrap();
    let config = load_config(&path).expect("config loads");
    assert_eq!(require_slack_token(&config).unwrap(), "xoxp-7");
    assert!(config.gist_token().is_none());
}
