pub mod blocklist;
pub mod limits;
pub mod resetfile;
pub mod run;
pub mod toggle;

use crate::host::{Outbox, Terminal};
use crate::runtime::Runtime;
use std::path::Path;
use std::sync::Arc;

/// Load a [`Runtime`] for a single command outside of a session.
///
/// No queue consumers are started; the runtime only exists to read and
/// update the files under `root`.
pub(crate) fn one_shot<T>(
    root: &Path,
    f: impl FnOnce(&mut Runtime) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let _guard = rt.enter();
    let mut runtime = Runtime::new(root, Arc::new(Outbox::new(None)), Arc::new(Terminal))?;
    f(&mut runtime)
}
