use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::RouteSettings;
use crate::pipeline::{Configurable, PayloadRecord, PayloadSaver, PipelineError};

/// Writes each payload to its own numbered file under `output_folder`.
///
/// The index is per instance and starts at 1, so a restart reuses names; files
/// are opened in append mode and nothing is overwritten.
#[derive(Debug, Default)]
pub struct SimpleFileSystemSaver {
    root: PathBuf,
    base_name: String,
    counter: AtomicU64,
    debug: bool,
}

impl SimpleFileSystemSaver {
    pub const NAME: &'static str = "SimpleFileSystemSaver";

    fn file_name(&self, index: u64) -> PathBuf {
        self.root.join(render_file_name(&self.base_name, index))
    }
}

/// Replace the first `%d` in `pattern` with `index`, or append it if there is none.
pub fn render_file_name(pattern: &str, index: u64) -> String {
    if pattern.contains("%d") {
        pattern.replacen("%d", &index.to_string(), 1)
    } else {
        format!("{pattern}{index}")
    }
}

fn io_error(path: &std::path::Path, source: std::io::Error) -> PipelineError {
    PipelineError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl Configurable for SimpleFileSystemSaver {
    fn configure(&mut self, settings: &RouteSettings) -> Result<(), PipelineError> {
        if settings.base_name.is_empty() {
            return Err(PipelineError::InvalidSetting {
                field: "base_name",
                reason: "must not be empty".to_string(),
            });
        }
        self.root = PathBuf::from(&settings.output_folder);
        self.base_name = settings.base_name.clone();
        self.debug = settings.debug;
        Ok(())
    }
}

#[async_trait]
impl PayloadSaver for SimpleFileSystemSaver {
    async fn save(&self, payload: Option<&PayloadRecord>) -> Result<(), PipelineError> {
        let payload = payload.ok_or(PipelineError::MissingPayload)?;
        let index = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.file_name(index);
        if self.debug {
            tracing::debug!(path = %path.display(), "Saving payload");
        }

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error(&self.root, e))?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .await
            .map_err(|e| io_error(&path, e))?;
        file.write_all(payload.to_string().as_bytes())
            .await
            .map_err(|e| io_error(&path, e))?;
        file.flush().await.map_err(|e| io_error(&path, e))?;
        Ok(())
    }
}
