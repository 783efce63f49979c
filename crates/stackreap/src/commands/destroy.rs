use crate::target::TargetArgs;
use colored::Colorize;
use stackreap_config::Settings;
use stackreap_core::{Teardown, TeardownReport};
use std::time::Duration;

pub async fn handle(args: &TargetArgs, settings: Settings) -> anyhow::Result<()> {
    let target = args.resolve(&settings.cluster.cluster_id_key)?;
    println!("{}", "Tearing down cluster...".yellow());
    super::print_target(&target);
    println!();

    let connector = super::connect(&target).await?;
    let teardown = Teardown::new(connector, target.tags, target.infra_id, settings)?;

    println!();
    println!("{}", "Deleting resources...".blue());
    match teardown.run().await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Teardown failed".red().bold());
            if let Some(task) = e.task() {
                eprintln!("  task: {}", task.yellow());
            }
            eprintln!("  {}", e);
            eprintln!();
            eprintln!("Re-running the command resumes from what is left.");
            Err(e.into())
        }
    }
}

fn print_report(report: &TeardownReport) {
    println!();
    println!("{}", format!("Tasks ({}):", report.tasks.len()).bold());
    for task in &report.tasks {
        let attempts = if task.attempts == 1 {
            "1 attempt".to_string()
        } else {
            format!("{} attempts", task.attempts)
        };
        println!(
            "  {} {} {:<9} {:>12}  {}",
            "✓".green(),
            format!("{:<32}", task.name).cyan(),
            task.phase.to_string(),
            attempts,
            format_duration(task.elapsed)
        );
    }

    let total = report.finished_at - report.started_at;
    println!();
    println!(
        "{}",
        format!(
            "✓ Teardown complete in {} (started {})",
            format_duration(total.to_std().unwrap_or_default()),
            report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .green()
        .bold()
    );
}

fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    match secs {
        0..=59 => format!("{:.1}s", elapsed.as_secs_f64()),
        60..=3599 => format!("{}m{:02}s", secs / 60, secs % 60),
        _ => format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60),
    }
}
