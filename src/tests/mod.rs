mod test_model_assembly;

use crate::input::{MET_HISTORY_FILE_NAME, TILT_FILE_NAME};
use crate::output::Output;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

/// Keeps every output in memory, keyed by `{key}.{extension}`.
#[derive(Debug, Default)]
pub(crate) struct MemoryOutput {
    files: Rc<RefCell<IndexMap<String, Vec<u8>>>>,
}

impl MemoryOutput {
    pub(crate) fn contents(&self, name: &str) -> Option<String> {
        self.files
            .borrow()
            .get(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }
}

impl Output for MemoryOutput {
    fn writer_for_key(&self, key: &str, file_extension: &str) -> anyhow::Result<impl Write> {
        let name = format!("{key}.{file_extension}");
        self.files.borrow_mut().insert(name.clone(), vec![]);

        Ok(MemoryWriter {
            name,
            files: self.files.clone(),
        })
    }
}

struct MemoryWriter {
    name: String,
    files: Rc<RefCell<IndexMap<String, Vec<u8>>>>,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.files
            .borrow_mut()
            .entry(self.name.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One hot, sunny sample every hour for `hours` hours, after a header row.
pub(crate) fn met_history_csv(hours: usize) -> String {
    let mut lines = vec![
        "elapsed,temp,temp_sky,temp_ground,poai,dni,wind_speed,elevation_projected,\
         abs_glass,abs_encapsulant,abs_cell,current_factor"
            .to_string(),
    ];
    for hour in 0..=hours {
        lines.push(format!(
            "{},293.15,270,300,1000,800,2,0.8,40,10,700,1",
            hour * 3600
        ));
    }
    lines.join("\n")
}

/// A fresh directory holding a tilt file and a meteorological history.
pub(crate) fn project_dir(name: &str, tilt: &str, hours: usize) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pvtherm-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(TILT_FILE_NAME), tilt).unwrap();
    fs::write(dir.join(MET_HISTORY_FILE_NAME), met_history_csv(hours)).unwrap();
    dir
}
