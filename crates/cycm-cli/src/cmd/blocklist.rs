use crate::output::{finish, print_json};
use std::path::Path;

use super::one_shot;

pub fn block(root: &Path, command: &[String], json: bool) -> anyhow::Result<()> {
    let notice = one_shot(root, |rt| Ok(rt.block(&command.join(" "))))?;
    finish(notice, json)
}

pub fn unblock(root: &Path, command: &[String], json: bool) -> anyhow::Result<()> {
    let notice = one_shot(root, |rt| Ok(rt.unblock(&command.join(" "))))?;
    finish(notice, json)
}

pub fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    one_shot(root, |rt| {
        if json {
            let value = serde_json::json!({ "blocked": rt.blocked() });
            print_json(&value)
        } else {
            finish(rt.blocklist(), false)
        }
    })
}
