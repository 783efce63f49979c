use crate::target::TargetArgs;
use colored::Colorize;
use stackreap_config::Settings;
use stackreap_core::{DestroyError, Teardown};

pub async fn handle(args: &TargetArgs, settings: Settings) -> anyhow::Result<()> {
    let target = args.resolve(&settings.cluster.cluster_id_key)?;
    super::print_target(&target);
    println!();

    let connector = super::connect(&target).await?;
    let teardown = Teardown::new(connector, target.tags, target.infra_id, settings)?;

    println!("{}", "Checking network extensions...".blue());
    match teardown.validate_cloud().await {
        Ok(()) => {
            let extensions = &teardown.context().settings.cluster.required_network_extensions;
            println!("  {} {}", "✓".green(), extensions.join(", "));
            println!();
            println!("{}", "✓ The cloud supports teardown".green().bold());
            Ok(())
        }
        Err(e @ DestroyError::UnsupportedCloud(_)) => {
            eprintln!();
            eprintln!("{}", "✗ The cloud does not support teardown".red().bold());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
