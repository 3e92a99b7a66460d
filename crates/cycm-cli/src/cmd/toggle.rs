use crate::output::finish;
use std::path::Path;

use super::one_shot;

/// `cycm on` / `cycm off` outside a session: persist the flag.
pub fn run(root: &Path, enabled: bool, json: bool) -> anyhow::Result<()> {
    let notice = one_shot(root, |rt| Ok(rt.set_enabled(enabled)))?;
    finish(notice, json)
}
