use gislack::commands::auth::{run_auth, AuthMode};
use gislack::options::{AuthOperation, ClientPair};
use gislack_core::config::{AccessToken, GislackConfig, GistAccessToken, SlackAccessToken};
use gislack_core::contract::{MockAuthorizer, MockTransport, Reply};
use gislack_core::Service;

fn gist_pair() -> ClientPair {
    ClientPair {
        service: Service::Gist,
        client_id: "gid".to_string(),
        client_secret: "gsecret".to_string(),
    }
}

#[tokio::test]
async fn interactive_flow_stores_clients_and_token() {
    let mut authorizer = MockAuthorizer::new();
    authorizer
        .expect_obtain_token()
        .withf(|service, id, secret, port| {
            *service == Service::Gist && id == "gid" && secret == "gsecret" && *port == 8080
        })
        .times(1)
        .returning(|_, _, _, _| {
            Ok(AccessToken::Gist(GistAccessToken {
                access_token: "gho_1".to_string(),
                token_type: "bearer".to_string(),
                scope: "gist,repo".to_string(),
            }))
        });
    let mut config = GislackConfig::default();

    let (text, changed) = run_auth(
        &AuthOperation::Authorize {
            clients: vec![gist_pair()],
            port: 8080,
        },
        AuthMode::Interactive,
        &mut config,
        &authorizer,
        &MockTransport::new(),
    )
    .await
    .unwrap();

    assert_eq!(text, "Done.");
    assert!(changed);
    assert_eq!(config.gist.client_id, "gid");
    assert_eq!(config.gist_token(), Some("gho_1"));
}

#[tokio::test]
async fn show_url_mode_never_starts_the_flow() {
    let authorizer = MockAuthorizer::new();
    let mut config = GislackConfig::default();

    let (text, changed) = run_auth(
        &AuthOperation::Authorize {
            clients: vec![gist_pair()],
            port: 8080,
        },
        AuthMode::ShowUrl,
        &mut config,
        &authorizer,
        &MockTransport::new(),
    )
    .await
    .unwrap();

    assert!(text.starts_with("https://github.com/login/oauth/authorize?client_id=gid"));
    assert!(!changed);
    assert_eq!(config, GislackConfig::default());
}

#[tokio::test]
async fn code_exchange_uses_saved_client_credentials() {
    let mut config = GislackConfig::default();
    config.slack.client_id = "sid".to_string();
    config.slack.client_secret = "ssecret".to_string();
    let mut authorizer = MockAuthorizer::new();
    authorizer
        .expect_exchange_code()
        .withf(|service, id, secret, code| {
            *service == Service::Slack && id == "sid" && secret == "ssecret" && code == "c0de"
        })
        .returning(|_, _, _, _| {
            Ok(AccessToken::Slack(SlackAccessToken {
                ok: Some(true),
                access_token: "xoxp-3".to_string(),
                ..Default::default()
            }))
        });

    let (_, changed) = run_auth(
        &AuthOperation::Exchange {
            service: Service::Slack,
            code: "c0de".to_string(),
            clients: vec![],
        },
        AuthMode::ShowUrl,
        &mut config,
        &authorizer,
        &MockTransport::new(),
    )
    .await
    .unwrap();

    assert!(changed);
    assert_eq!(config.slack_token(), Some("xoxp-3"));
}

#[tokio::test]
async fn exchange_without_client_credentials_fails() {
    let mut config = GislackConfig::default();
    let err = run_auth(
        &AuthOperation::Exchange {
            service: Service::Gist,
            code: "c0de".to_string(),
            clients: vec![],
        },
        AuthMode::ShowUrl,
        &mut config,
        &MockAuthorizer::new(),
        &MockTransport::new(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("--gistclientid"));
}

#[tokio::test]
async fn rate_limit_is_printed_as_json() {
    let mut config = GislackConfig::default();
    config.gist.client_id = "gid".to_string();
    config.gist.client_secret = "gsecret".to_string();
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .withf(|r| r.url().starts_with("https://api.github.com/rate_limit?client_id=gid"))
        .returning(|_| {
            let mut reply = Reply::from_body("{}");
            reply.headers.insert("x-ratelimit-limit".into(), "60".into());
            reply.headers.insert("x-ratelimit-remaining".into(), "59".into());
            Ok(reply)
        });

    let (text, changed) = run_auth(
        &AuthOperation::CheckGistToken,
        AuthMode::Interactive,
        &mut config,
        &MockAuthorizer::new(),
        &transport,
    )
    .await
    .unwrap();

    assert!(!changed);
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["MaxLimit"], "60");
    assert_eq!(parsed["Remaining"], "59");
}
