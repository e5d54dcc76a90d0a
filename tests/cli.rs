use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::{tempdir, TempDir};

fn gislack() -> Command {
    let mut cmd = Command::cargo_bin("gislack").expect("Binary exists");
    cmd.env_remove("GISLACK_CFG_PATH").env_remove("RUST_LOG");
    cmd
}

/// A config directory holding a `gislack.cfg` with the given content.
fn config_dir(content: &str) -> TempDir {
    let dir = tempdir().expect("Creating temp dir failed");
    write(dir.path().join("gislack.cfg"), content).expect("Writing temp config failed");
    dir
}

#[test]
fn json_appcheck_prints_ok() {
    gislack()
        .args(["json", "--json", r#"{"command":"appcheck","options":{"appcheck":true}}"#])
        .assert()
        .success()
        .stdout("ok\n");
}

#[test]
fn missing_config_points_to_auth() {
    let dir = tempdir().unwrap();
    gislack()
        .args(["gist", "--list", "--cfgdirectory"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("gislack.cfg is not found").and(predicate::str::contains("gislack auth")));
}

#[test]
fn config_directory_can_come_from_env() {
    let dir = config_dir("{ not json");
    gislack()
        .args(["slack", "--channellist"])
        .env("GISLACK_CFG_PATH", dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("format error of"));
}

#[test]
fn missing_gist_token_names_the_auth_flags() {
    let dir = config_dir(r#"{"slack":{"SlackAccesstoken":{"access_token":"xoxp-1"}}}"#);
    gislack()
        .args(["g", "--list", "--cfgdir"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--gistclientid"));
}

#[test]
fn slack_without_an_action_prints_usage() {
    gislack()
        .arg("slack")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage is `gislack slack --help'"));
}

#[test]
fn doublesubmit_requires_a_channel() {
    let dir = config_dir("{}");
    gislack()
        .args(["doublesubmit", "--title", "t", "--file", "a.txt", "--cfgdirectory"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("a channel is required"));
}

#[test]
fn json_auth_without_code_shows_the_authorize_url() {
    let dir = tempdir().unwrap();
    let document = format!(
        r#"{{"command":"auth","options":{{"gistclientid":"abc","gistclientsecret":"def","cfgdirectory":"{}"}}}}"#,
        dir.path().display()
    );
    gislack()
        .args(["json", "--json", &document])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "https://github.com/login/oauth/authorize?client_id=abc&scope=gist+repo",
        ));
    assert!(!dir.path().join("gislack.cfg").exists());
}

#[test]
fn malformed_json_document_is_an_error() {
    gislack()
        .args(["json", "--json", "{command"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("JSON Format error"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    gislack().arg("gitlab").assert().code(2);
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use gislack::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Json {
            json: r#"{"command":"appcheck","options":{"appcheck":true}}"#.to_string(),
        },
    };

    let _ = run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
