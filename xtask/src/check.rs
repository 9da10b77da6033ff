use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Cortex-M target the recorder core has to build for.
const DEVICE_TARGET: &str = "thumbv7em-none-eabihf";

struct Step {
    label: &'static str,
    args: &'static [&'static str],
    /// Failure only prints a warning.
    advisory: bool,
}

const STEPS: &[Step] = &[
    Step {
        label: "voice core (no_std, device target)",
        args: &["check", "-p", "voice", "--target", DEVICE_TARGET, "--no-default-features"],
        advisory: false,
    },
    Step {
        label: "platform traits (no_std, device target)",
        args: &["check", "-p", "platform", "--target", DEVICE_TARGET, "--no-default-features"],
        advisory: false,
    },
    Step {
        label: "host build (std, xtask)",
        args: &["check", "--workspace", "--all-targets"],
        advisory: false,
    },
    Step {
        label: "clippy",
        args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        advisory: true,
    },
    Step {
        label: "formatting",
        args: &["fmt", "--all", "--check"],
        advisory: true,
    },
];

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking voice memo builds...".cyan().bold());
    println!();

    let total_start = Instant::now();
    for step in STEPS {
        run_step(step)?;
    }

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

fn run_step(step: &Step) -> Result<()> {
    println!("{}", format!("  Checking {}...", step.label).cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(step.args)
        .output()
        .with_context(|| format!("Failed to run cargo for {}", step.label))?;

    if output.status.success() {
        println!(
            "{}",
            format!("  ✓ {} passed in {:.2}s", step.label, start.elapsed().as_secs_f64()).green()
        );
    } else if step.advisory {
        eprintln!("{}", format!("  ⚠ {} reported issues", step.label).yellow().bold());
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
    } else {
        eprintln!("{}", format!("  ✗ {} failed", step.label).red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("{} failed", step.label);
    }
    println!();
    Ok(())
}
