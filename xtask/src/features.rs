use std::process::Command;

use anyhow::{Context, Result};

const PACKAGE: &str = "utilkit-common";

/// (label, extra cargo args) for every supported feature combination.
///
/// `serde` is the only optional feature and is on by default, so default and
/// no-default cover every distinct build.
const FEATURE_COMBINATIONS: &[(&str, &[&str])] =
    &[("default", &[]), ("no-default-features", &["--no-default-features"])];

/// Run the library's test suite under every supported feature combination.
pub fn test_feature_matrix() -> Result<()> {
    println!("Testing {} {PACKAGE} feature combinations...", FEATURE_COMBINATIONS.len());

    for (index, (label, extra_args)) in FEATURE_COMBINATIONS.iter().enumerate() {
        println!(
            "\n[{}/{}] cargo test -p {PACKAGE} {}",
            index + 1,
            FEATURE_COMBINATIONS.len(),
            extra_args.join(" ")
        );

        let status = Command::new("cargo")
            .args(["test", "-p", PACKAGE])
            .args(*extra_args)
            .status()
            .with_context(|| format!("Failed to run cargo test for '{label}'"))?;

        if !status.success() {
            anyhow::bail!("Feature combination '{label}' failed");
        }

        println!("✅ Features '{label}' passed");
    }

    println!("\n✅ All {} feature combinations pass!", FEATURE_COMBINATIONS.len());

    Ok(())
}
