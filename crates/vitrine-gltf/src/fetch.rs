use crate::parse::parse_model;
use anyhow::{Context, anyhow};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use vitrine_3d::ModelData;

pub const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Whole percentage, only when the total size is known and non-zero.
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        Some((self.loaded.min(total) * 100 / total) as u8)
    }

    pub fn loaded_megabytes(&self) -> f64 {
        self.loaded as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug)]
pub enum LoadEvent {
    Progress(LoadProgress),
    Loaded(ModelData),
    Failed(anyhow::Error),
}

impl LoadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadEvent::Progress(_))
    }
}

/// Producer side of a load. Consuming `finish` guarantees at most one
/// terminal event per sender chain.
#[derive(Clone)]
pub struct LoadSender {
    tx: Sender<LoadEvent>,
}

impl LoadSender {
    /// Returns `false` once the receiving handle is gone.
    pub fn progress(&self, progress: LoadProgress) -> bool {
        self.tx.send(LoadEvent::Progress(progress)).is_ok()
    }

    pub fn finish(self, result: anyhow::Result<ModelData>) {
        let event = match result {
            Ok(model) => LoadEvent::Loaded(model),
            Err(err) => LoadEvent::Failed(err),
        };
        if self.tx.send(event).is_err() {
            log::debug!("load finished after its handle was dropped");
        }
    }
}

pub fn channel() -> (LoadSender, LoadHandle) {
    let (tx, rx) = mpsc::channel();
    (
        LoadSender { tx },
        LoadHandle {
            rx,
            settled: false,
        },
    )
}

/// Consumer side of a load: an ordered stream of progress events closed by
/// exactly one `Loaded` or `Failed`.
pub struct LoadHandle {
    rx: Receiver<LoadEvent>,
    settled: bool,
}

impl LoadHandle {
    /// Non-blocking poll for the frame loop.
    pub fn try_next(&mut self) -> Option<LoadEvent> {
        if self.settled {
            return None;
        }
        let event = match self.rx.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                LoadEvent::Failed(anyhow!("model loader exited without a result"))
            }
        };
        self.settled = event.is_terminal();
        Some(event)
    }

    /// Blocks until the next event, `None` once settled.
    pub fn wait(&mut self) -> Option<LoadEvent> {
        if self.settled {
            return None;
        }
        let event = self.rx.recv().unwrap_or_else(|_| {
            LoadEvent::Failed(anyhow!("model loader exited without a result"))
        });
        self.settled = event.is_terminal();
        Some(event)
    }
}

pub fn spawn_load(path: impl Into<PathBuf>) -> LoadHandle {
    spawn_load_chunked(path, CHUNK_SIZE)
}

/// Reads and parses `path` on a background thread, reporting progress every
/// `chunk_size` bytes.
pub fn spawn_load_chunked(path: impl Into<PathBuf>, chunk_size: usize) -> LoadHandle {
    let path = path.into();
    let (sender, handle) = channel();
    let fallback = sender.clone();

    let spawned = std::thread::Builder::new()
        .name("vitrine-model-loader".into())
        .spawn(move || {
            let result = read_with_progress(&path, chunk_size.max(1), &sender)
                .and_then(|bytes| parse_model(&bytes))
                .with_context(|| format!("loading {}", path.display()));
            if let Err(err) = &result {
                log::warn!("model load failed: {err:#}");
            }
            sender.finish(result);
        });

    match spawned {
        Ok(_) => drop(fallback),
        Err(err) => fallback.finish(Err(anyhow!(err).context("spawning model loader"))),
    }
    handle
}

fn read_with_progress(
    path: &Path,
    chunk_size: usize,
    sender: &LoadSender,
) -> anyhow::Result<Vec<u8>> {
    let mut file = File::open(path).context("opening model file")?;
    let total = file.metadata().ok().map(|m| m.len());

    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; chunk_size];
    loop {
        let n = file.read(&mut chunk).context("reading model file")?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        let progress = LoadProgress {
            loaded: bytes.len() as u64,
            total,
        };
        if !sender.progress(progress) {
            anyhow::bail!("load abandoned");
        }
    }
    log::info!("read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::tests::{CYCLIC_GLTF, TRIANGLE_GLTF};
    use std::io::Write;

    fn drain(mut handle: LoadHandle) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.wait() {
            events.push(event);
        }
        assert!(handle.try_next().is_none());
        events
    }

    #[test]
    fn test_percent() {
        let p = LoadProgress {
            loaded: 50,
            total: Some(200),
        };
        assert_eq!(p.percent(), Some(25));
        assert_eq!(LoadProgress { loaded: 5, total: None }.percent(), None);
        assert_eq!(LoadProgress { loaded: 5, total: Some(0) }.percent(), None);
        assert_eq!(LoadProgress { loaded: 9, total: Some(4) }.percent(), Some(100));
    }

    #[test]
    fn test_garbage_file_fails_after_monotonic_progress() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0x42u8; 10_000]).unwrap();

        let events = drain(spawn_load_chunked(file.path(), 1024));
        let (last, progress) = events.split_last().unwrap();

        assert!(matches!(last, LoadEvent::Failed(_)));
        assert!(progress.iter().all(|e| !e.is_terminal()));
        assert_eq!(progress.len(), 10);

        let percents: Vec<u8> = progress
            .iter()
            .filter_map(|e| match e {
                LoadEvent::Progress(p) => p.percent(),
                _ => None,
            })
            .collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(percents.last(), Some(&100));
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let events = drain(spawn_load(dir.path().join("missing.glb")));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LoadEvent::Failed(_)));
    }

    #[test]
    fn test_valid_file_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRIANGLE_GLTF.as_bytes()).unwrap();

        let events = drain(spawn_load(file.path()));
        match events.last() {
            Some(LoadEvent::Loaded(model)) => assert_eq!(model.triangle_count(), 1),
            other => panic!("unexpected terminal event: {other:?}"),
        }
    }

    #[test]
    fn test_cyclic_hierarchy_settles_as_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CYCLIC_GLTF.as_bytes()).unwrap();

        let events = drain(spawn_load(file.path()));
        match events.last() {
            Some(LoadEvent::Failed(err)) => assert!(format!("{err:#}").contains("cycle")),
            other => panic!("unexpected terminal event: {other:?}"),
        }
    }

    #[test]
    fn test_dropped_sender_settles_as_failure() {
        let (sender, mut handle) = channel();
        drop(sender);
        assert!(matches!(handle.try_next(), Some(LoadEvent::Failed(_))));
        assert!(handle.try_next().is_none());
        assert!(handle.wait().is_none());
    }
}
