use anyhow::Result;

use crate::{report, runtime::Runtime};

use super::{GlobalOptions, load_release, resolve_prefix};

/// Run the `--version` smoke test. Returns whether it passed.
#[tracing::instrument(skip(runtime, options))]
pub fn verify<R: Runtime>(
    runtime: R,
    options: &GlobalOptions,
    version: Option<&str>,
) -> Result<bool> {
    let release = load_release(&runtime, options)?;
    let prefix = resolve_prefix(&runtime, options)?;
    let version = version.unwrap_or(&release.version);

    let passed = report::verify(&runtime, &prefix, release.binary_name(), version);
    if passed {
        println!("      passed {} {}", release.binary_name(), version);
    } else {
        println!("      failed {} {}", release.binary_name(), version);
    }
    Ok(passed)
}
