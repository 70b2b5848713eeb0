use formatx::formatx;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Default name for files written by [`FileOutput`]: the output key, then the extension.
pub const DEFAULT_FILE_TEMPLATE: &str = "ModelOutput_{}.{}";

/// A place to write named outputs, such as the model description and result tables.
pub trait Output: Debug {
    fn writer_for_key(&self, key: &str, file_extension: &str) -> anyhow::Result<impl Write>;
    /// Whether writing to this output can be skipped altogether.
    fn is_noop(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }

    pub fn in_directory(directory_path: PathBuf) -> Self {
        Self::new(directory_path, DEFAULT_FILE_TEMPLATE.to_string())
    }

    fn path_for_key(&self, key: &str, file_extension: &str) -> anyhow::Result<PathBuf> {
        let file_name = formatx!(&self.file_template, key, file_extension)
            .map_err(|e| anyhow::anyhow!("bad output file template {:?}: {e}", self.file_template))?;

        Ok(self.directory_path.join(file_name))
    }
}

impl Output for FileOutput {
    fn writer_for_key(&self, key: &str, file_extension: &str) -> anyhow::Result<impl Write> {
        Ok(BufWriter::new(File::create(
            self.path_for_key(key, file_extension)?,
        )?))
    }
}

impl Output for &FileOutput {
    fn writer_for_key(&self, key: &str, file_extension: &str) -> anyhow::Result<impl Write> {
        <FileOutput as Output>::writer_for_key(self, key, file_extension)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_key(&self, _key: &str, _file_extension: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}
