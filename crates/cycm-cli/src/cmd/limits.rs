use crate::output::finish;
use std::path::Path;

use super::one_shot;

pub fn num(root: &Path, value: i64, json: bool) -> anyhow::Result<()> {
    let notice = one_shot(root, |rt| Ok(rt.set_max_repeats(value)))?;
    finish(notice, json)
}

pub fn delay(root: &Path, value: i64, json: bool) -> anyhow::Result<()> {
    let notice = one_shot(root, |rt| Ok(rt.set_max_delay(value)))?;
    finish(notice, json)
}
