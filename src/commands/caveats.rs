use anyhow::{Result, bail};

use crate::{report, runtime::Runtime};

use super::{GlobalOptions, load_release, resolve_prefix};

/// Print the caveats for what is currently installed under the prefix.
#[tracing::instrument(skip(runtime, options))]
pub fn caveats<R: Runtime>(runtime: R, options: &GlobalOptions) -> Result<()> {
    let release = load_release(&runtime, options)?;
    let prefix = resolve_prefix(&runtime, options)?;
    let binary = release.binary_name();

    let Some(layout) = report::existing_layout(&runtime, &prefix, binary) else {
        bail!(
            "{} is not installed under {}; run `toli-installer install` first",
            binary,
            prefix.display()
        );
    };
    print!("{}", report::caveats(&layout, binary, &release.aliases));
    Ok(())
}
