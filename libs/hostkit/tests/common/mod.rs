#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use hostkit::discovery::ENTRY_POINT;
use hostkit::{HostModule, ModuleCatalog, ModuleCtx};

/// Write an entry point declaring `module` into `dir`, creating it if needed.
pub fn write_entry(dir: &Path, module: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(ENTRY_POINT);
    fs::write(&path, format!("module: {module}\n")).unwrap();
    path
}

pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Module that appends its name to a shared log when registered.
pub struct Recorder {
    pub label: String,
    pub log: CallLog,
    pub fail: bool,
}

impl HostModule for Recorder {
    fn register(&self, _ctx: &mut ModuleCtx<'_>) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(self.label.clone());
        if self.fail {
            anyhow::bail!("{} refused to register", self.label);
        }
        Ok(())
    }
}

/// Catalog with one recording module per name; names in `failing` fail to register.
pub fn recording_catalog(names: &[&str], failing: &[&str], log: &CallLog) -> ModuleCatalog {
    let mut catalog = ModuleCatalog::new();
    for name in names {
        let label = (*name).to_owned();
        let fail = failing.contains(name);
        let log = log.clone();
        catalog
            .register(*name, move || {
                Box::new(Recorder {
                    label: label.clone(),
                    log: log.clone(),
                    fail,
                })
            })
            .unwrap();
    }
    catalog
}
