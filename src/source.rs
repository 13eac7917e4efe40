use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt};
use thiserror::Error;

/// Spins the target around Y by `delta * 100` degrees per tick.
pub const DEFAULT_SCRIPT: &str = r#"
fn updateFunction(delta) {
    let y = (GetRotationY() + delta * 100.0) % 360.0;
    if y < 0.0 {
        y += 360.0;
    }
    SetRotation(GetRotationX(), y, GetRotationZ());
}
"#;

#[derive(Debug, Error)]
pub enum ScriptLoadError {
    #[error("failed to read script '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("script load for '{0}' was abandoned")]
    Cancelled(String),
    #[error("script '{name}' failed to parse: {message}")]
    Parse { name: String, message: String },
    #[error("script '{name}' failed during top-level execution: {message}")]
    Execute { name: String, message: String },
    #[error("script host already failed: {0}")]
    AlreadyFailed(String),
    #[error("script host was never started")]
    NotStarted,
}

pub type LoadFuture = BoxFuture<'static, Result<String, ScriptLoadError>>;

/// Something that can produce script text, possibly after waiting on I/O.
pub trait ScriptSource {
    fn name(&self) -> &str;
    fn load(&self) -> LoadFuture;
}

#[derive(Debug, Clone)]
pub struct InlineSource {
    name: String,
    text: String,
}

impl InlineSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self::named("inline", text)
    }

    pub fn named(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), text: text.into() }
    }
}

impl ScriptSource for InlineSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> LoadFuture {
        future::ready(Ok(self.text.clone())).boxed()
    }
}

/// Reads the script on a worker thread so the frame loop never waits on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl ScriptSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> LoadFuture {
        let (tx, rx) = oneshot::channel();
        let path = self.path.clone();
        let spawned = thread::Builder::new().name("script-loader".to_string()).spawn(move || {
            let result = fs::read_to_string(&path).map_err(|source| ScriptLoadError::Io { path, source });
            // The receiver is gone when the host was dropped mid-load.
            let _ = tx.send(result);
        });
        if let Err(source) = spawned {
            let err = ScriptLoadError::Io { path: self.path.clone(), source };
            return future::ready(Err(err)).boxed();
        }
        let name = self.name.clone();
        rx.map(move |received| received.unwrap_or_else(|_| Err(ScriptLoadError::Cancelled(name)))).boxed()
    }
}
