use crate::output::finish;
use std::path::Path;

use super::one_shot;

pub fn run(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let notice = one_shot(root, |rt| Ok(rt.reset_file(name)))?;
    finish(notice, json)
}
