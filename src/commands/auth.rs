
use anyhow::{anyhow, Result};
use gislack_core::auth::{authorize_url, check_gist_token, OAuthAuthorizer};
use gislack_core::config::GislackConfig;
use gislack_core::contract::{Authorizer, Transport};
use gislack_core::render::to_json;
use gislack_core::Service;
use tracing::info;

use crate::load_config::{load_optional, locate};
use crate::options::{AuthArgs, AuthOperation, ClientPair};

/// Whether the redirect flow may run, or the user completes it by hand (JSON control mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Interactive,
    ShowUrl,
}

pub async fn auth(args: AuthArgs, mode: AuthMode) -> Result<String> {
    let operation = AuthOperation::try_from(&args)?;
    let location = locate(&args)?;
    let mut config = load_optional(&location.file)?.unwrap_or_default();
    let transport = super::http_transport()?;
    let authorizer = OAuthAuthorizer::new(transport.clone());
    let (text, changed) = run_auth(&operation, mode, &mut config, &authorizer, &transport).await?;
    if changed {
        config.save(&location.file)?;
    }
    Ok(text)
}

fn remember_client(config: &mut GislackConfig, pair: &ClientPair) {
    let (id, secret) = match pair.service {
        Service::Gist => (&mut config.gist.client_id, &mut config.gist.client_secret),
        Service::Slack => (&mut config.slack.client_id, &mut config.slack.client_secret),
    };
    *id = pair.client_id.clone();
    *secret = pair.client_secret.clone();
}

fn client_of(config: &GislackConfig, service: Service) -> Result<(String, String)> {
    let (id, secret) = match service {
        Service::Gist => (&config.gist.client_id, &config.gist.client_secret),
        Service::Slack => (&config.slack.client_id, &config.slack.client_secret),
    };
    if id.is_empty() || secret.is_empty() {
        return Err(anyhow!(
            "no client ID and client secret for {service}. Give them with --{service}clientid and --{service}clientsecret."
        ));
    }
    Ok((id.clone(), secret.clone()))
}

/// Runs one auth operation against `config`; the flag reports whether it must be saved.
pub async fn run_auth<A, T>(
    operation: &AuthOperation,
    mode: AuthMode,
    config: &mut GislackConfig,
    authorizer: &A,
    transport: &T,
) -> Result<(String, bool)>
where
    A: Authorizer + ?Sized,
    T: Transport + ?Sized,
{
    match operation {
        AuthOperation::Authorize { clients, port } => {
            if mode == AuthMode::ShowUrl {
                let urls = clients
                    .iter()
                    .map(|c| authorize_url(c.service, &c.client_id))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok((urls.join("\n"), false));
            }
            for pair in clients {
                remember_client(config, pair);
                let token = authorizer
                    .obtain_token(pair.service, &pair.client_id, &pair.client_secret, *port)
                    .await?;
                info!(service = %pair.service, "Access token obtained");
                config.apply_token(token);
            }
            Ok(("Done.".to_string(), true))
        }
        AuthOperation::Exchange {
            service,
            code,
            clients,
        } => {
            for pair in clients {
                remember_client(config, pair);
            }
            let (id, secret) = client_of(config, *service)?;
            let token = authorizer.exchange_code(*service, &id, &secret, code).await?;
            config.apply_token(token);
            Ok(("Done.".to_string(), true))
        }
        AuthOperation::CheckGistToken => {
            let (id, secret) = client_of(config, Service::Gist)?;
            let limit = check_gist_token(transport, &id, &secret).await?;
            Ok((to_json(&limit, true)?, false))
        }
    }
}
