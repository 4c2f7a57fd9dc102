/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use robin_server::backend::Backend;
use robin_server::bot_analyzer::DiagnosticBotAnalyzer;
use robin_server::cli::Args;
use robin_server::config::ServerConfig;
use robin_server::local_users::TableLocalUserResolver;
use robin_working::processors::{
    AvProcessor, BotDispatchProcessor, LocalDeliveryProcessor, ProxyConnections, ProxyStreamProcessor,
    QueueDecisionProcessor, RspamdClient, SpamProcessor, WebhookConfig, WebhookRawProcessor,
};
use robin_working::Chain;
use std::sync::Arc;

/// Builder separating process initialization from the running process, per
/// the workspace's other binaries.
struct Server {
    hostname: String,
    listener: robin_receiver::smtp::server::Listener,
    cron: robin_queue::QueueCron<Backend, robin_delivery::RemoteDeliverer>,
}

impl Server {
    async fn build() -> Result<Self, Box<dyn std::error::Error>> {
        let Args { config } = <Args as clap::Parser>::parse();
        let config = ServerConfig::from_toml_file(&config).map_err(|error| {
            eprintln!("Failed to boot Robin: {error}");
            error
        })?;

        robin_common::init_logs(config.logs.levels.clone().into_iter().collect(), config.logs.default_level);

        let backend = Arc::new(Backend::open(&config.queue_backend, &config.spool_path("queue"))?);
        let cron_config = config.cron.to_cron_config(&config.spool_path("queue"));

        let mut users = robin_auth::UserTable::new();
        for entry in &config.users {
            users.insert(entry.username.clone(), &entry.password);
        }
        let authenticator: Option<Arc<dyn robin_auth::Authenticator>> =
            if config.users.is_empty() { None } else { Some(Arc::new(users)) };

        let resolver = robin_delivery::mx::SecureMxResolver::system()?;
        let deliverer = Arc::new(robin_delivery::RemoteDeliverer::new(resolver, config.delivery));
        let bounce_builder = robin_queue::BounceBuilder::new(config.hostname.clone());
        let cron = robin_queue::QueueCron::new(Arc::clone(&backend), Arc::clone(&deliverer), bounce_builder, cron_config);

        let proxy_connections = Arc::new(ProxyConnections::new());

        let mut stages: Vec<Box<dyn robin_working::StorageProcessor>> = Vec::new();

        if let Some(antivirus) = &config.antivirus {
            let params = robin_plugin_clamav::Parameters {
                url: antivirus.url.clone(),
                max_connections: antivirus.max_connections,
            };
            let scanner = robin_plugin_clamav::Plugin::connect(&params)?;
            stages.push(Box::new(AvProcessor::new(scanner, antivirus.policy)));
        }

        if let Some(spam) = &config.spam {
            let client = RspamdClient::new(spam.url.clone());
            stages.push(Box::new(SpamProcessor::new(client, spam.threshold, spam.policy)));
        }

        if let Some(webhook) = &config.webhook {
            if !webhook.url.is_empty() {
                stages.push(Box::new(WebhookRawProcessor::new(WebhookConfig {
                    url: webhook.url.clone(),
                    base64: webhook.base64,
                    wait_for_response: webhook.wait_for_response,
                    hostname: config.hostname.clone(),
                })));
            }
        }

        if !config.bot_bindings.is_empty() {
            let analyzer = Arc::new(DiagnosticBotAnalyzer::new(config.hostname.clone()));
            stages.push(Box::new(BotDispatchProcessor::new(config.bot_bindings.clone(), analyzer, Arc::clone(&backend))));
        }

        let resolver = TableLocalUserResolver::from_entries(&config.local_users);
        stages.push(Box::new(LocalDeliveryProcessor::new(
            resolver,
            Arc::clone(&backend),
            robin_queue::BounceBuilder::new(config.hostname.clone()),
            std::collections::HashSet::from([75]),
        )));

        stages.push(Box::new(ProxyStreamProcessor::new(Arc::clone(&proxy_connections))));
        stages.push(Box::new(QueueDecisionProcessor::new(Arc::clone(&backend))));

        let chain = Arc::new(Chain::new(stages));

        let tls_config = if config.receiver.tls.root.is_some() || !config.receiver.tls.r#virtual.is_empty() {
            Some(Arc::new(robin_common::tls::get_rustls_config(
                &config.receiver.tls.protocol_version,
                &config.receiver.tls.cipher_suite,
                config.receiver.tls.preempt_cipherlist,
                &config.hostname,
                config.receiver.tls.root.as_ref(),
                &config.receiver.tls.r#virtual,
            )?))
        } else {
            None
        };

        let hostname = config.hostname.clone();
        let ctx = Arc::new(robin_receiver::smtp::session::SessionContext {
            hostname: hostname.clone(),
            product: "Robin".to_owned(),
            config: config.receiver,
            tls_config,
            authenticator,
            chain,
            proxy_rules: config.proxy_rules.clone(),
            bot_bindings: config.bot_bindings.clone(),
            proxy_connections,
        });

        let listener = robin_receiver::smtp::server::Listener::bind(&ctx.config, Arc::clone(&ctx)).await?;

        Ok(Self { hostname, listener, cron })
    }

    async fn run(self) {
        let Self { hostname, listener, cron } = self;
        tracing::info!(%hostname, "Robin is starting");

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let cron_task = tokio::spawn(async move { cron.run(shutdown_rx).await });

        tokio::select! {
            () = listener.serve() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
            }
        }

        let _ = shutdown_tx.send(true);
        let _ = cron_task.await;
    }
}

#[tokio::main]
async fn main() {
    let server = match Server::build().await {
        Ok(server) => server,
        Err(error) => {
            eprintln!("Failed to boot Robin: {error}");
            return;
        }
    };

    server.run().await;
}
