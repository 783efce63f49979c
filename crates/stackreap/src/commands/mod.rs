pub mod check;
pub mod destroy;

use crate::target::Target;
use colored::Colorize;
use stackreap_cloud::CloudConnector;
use stackreap_openstack::{OpenStackCli, OpenStackConnector};
use std::sync::Arc;

/// Builds the connector for `target` and makes sure its credentials work.
pub(crate) async fn connect(target: &Target) -> anyhow::Result<Arc<dyn CloudConnector>> {
    let connector = OpenStackConnector::new(OpenStackCli::new(target.cloud.clone()));

    println!("{}", "Checking credentials...".blue());
    let auth = connector.check_auth().await?;
    if !auth.authenticated {
        anyhow::bail!(
            "{} authentication failed: {}",
            connector.name(),
            auth.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    println!(
        "  {} {}",
        "✓".green(),
        auth.account_info.unwrap_or_else(|| "authenticated".to_string())
    );

    Ok(Arc::new(connector))
}

pub(crate) fn print_target(target: &Target) {
    println!("Infra ID: {}", target.infra_id.cyan());
    println!(
        "Cloud: {}",
        target.cloud.as_deref().unwrap_or("(from OS_* environment)").cyan()
    );
    println!("Tags:");
    for (key, value) in &target.tags {
        println!("  • {}={}", key, value.cyan());
    }
}
