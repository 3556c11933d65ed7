//! Pipeline plumbing: downstream sinks and a threaded transform stage.
//!
//! [`spawn`] runs an [`IndexTransform`] on a worker thread. Input arrives
//! over a bounded channel, so a fast producer blocks once the channel is
//! full instead of growing memory beyond what the host pipeline allows.
//! Decorated records (or the run's error) come out of a second bounded
//! channel in arrival order.
//!
//! ```rust
//! use streamdex_core::{build_index, stage, Emitter, FileRecord, Record};
//!
//! let transform = build_index("keywords", |record: &FileRecord, mut emitter: Emitter<String>| {
//!     emitter.emit("doc", record.identity());
//!     emitter.done();
//! })?;
//!
//! let mut handle = stage::spawn(transform, 16)?;
//! handle.send(FileRecord::new("a.md", ""))?;
//! handle.close();
//!
//! for decorated in handle.output() {
//!     let decorated = decorated?;
//!     assert_eq!(decorated.lookup("lookupKeywords", "doc")?, Some(vec!["a.md".to_string()]));
//! }
//! # Ok::<(), streamdex_core::IndexError>(())
//! ```

use crate::error::{IndexError, IndexResult};
use crate::facade::Decorated;
use crate::record::Record;
use crate::transform::IndexTransform;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

/// Downstream consumer of a pipeline stage.
pub trait RecordSink<T> {
    /// Delivers one item.
    fn push(&mut self, item: T) -> IndexResult<()>;

    /// Signals that no more items will be delivered.
    fn end(&mut self) -> IndexResult<()> {
        Ok(())
    }

    /// Signals that the run failed; no more items will be delivered.
    fn error(&mut self, _error: &IndexError) {}
}

impl<T> RecordSink<T> for Vec<T> {
    fn push(&mut self, item: T) -> IndexResult<()> {
        Vec::push(self, item);
        Ok(())
    }
}

enum StageEvent<R> {
    Record(R),
    Fail(String),
    End,
}

/// Output item of a stage: a decorated record or the run's error.
pub type StageOutput<R, V> = IndexResult<Decorated<R, V>>;

/// Handle to a transform running on its own thread.
pub struct StageHandle<R, V> {
    input: Option<SyncSender<StageEvent<R>>>,
    output: Receiver<StageOutput<R, V>>,
    worker: Option<JoinHandle<()>>,
}

/// Runs `transform` on a worker thread.
///
/// `capacity` bounds both the input and output channels (minimum 1).
pub fn spawn<R, V>(transform: IndexTransform<R, V>, capacity: usize) -> IndexResult<StageHandle<R, V>>
where
    R: Record,
    V: Clone + Send + Sync + 'static,
{
    let capacity = capacity.max(1);
    let (input_tx, input_rx) = mpsc::sync_channel(capacity);
    let (output_tx, output_rx) = mpsc::sync_channel(capacity);

    let worker = thread::Builder::new()
        .name(format!("streamdex-{}", transform.index_name()))
        .spawn(move || run(transform, input_rx, output_tx))?;

    Ok(StageHandle {
        input: Some(input_tx),
        output: output_rx,
        worker: Some(worker),
    })
}

fn run<R, V>(
    mut transform: IndexTransform<R, V>,
    input: Receiver<StageEvent<R>>,
    output: SyncSender<StageOutput<R, V>>,
) where
    R: Record,
    V: Clone + Send + Sync + 'static,
{
    for event in input {
        match event {
            StageEvent::Record(record) => {
                if let Err(error) = transform.push(record) {
                    let _ = output.send(Err(error));
                    return;
                }
            }
            StageEvent::Fail(reason) => {
                let _ = output.send(Err(transform.abort(reason)));
                return;
            }
            StageEvent::End => {
                let mut sink = ChannelSink { output: &output };
                if let Err(error) = transform.finish_into(&mut sink) {
                    let _ = output.send(Err(error));
                }
                return;
            }
        }
    }

    let _ = output.send(Err(transform.abort("input closed before end of input")));
}

struct ChannelSink<'a, T> {
    output: &'a SyncSender<IndexResult<T>>,
}

impl<T> RecordSink<T> for ChannelSink<'_, T> {
    fn push(&mut self, item: T) -> IndexResult<()> {
        self.output
            .send(Ok(item))
            .map_err(|_| IndexError::downstream("output receiver dropped"))
    }
}

impl<R, V> StageHandle<R, V> {
    /// Sends one record into the stage, blocking while the input is full.
    pub fn send(&self, record: R) -> IndexResult<()> {
        self.event(StageEvent::Record(record))
    }

    /// Aborts the run; the output yields [`IndexError::Aborted`].
    pub fn fail(&mut self, reason: impl Into<String>) -> IndexResult<()> {
        let result = self.event(StageEvent::Fail(reason.into()));
        self.input = None;
        result
    }

    /// Signals end of input. Decorated records become available on
    /// [`StageHandle::output`].
    pub fn close(&mut self) {
        if let Some(input) = self.input.take() {
            let _ = input.send(StageEvent::End);
        }
    }

    /// Returns an iterator over the stage's output, ending when the worker
    /// finishes.
    pub fn output(&self) -> mpsc::Iter<'_, StageOutput<R, V>> {
        self.output.iter()
    }

    /// Receives the next output item, or `None` once the stage is done.
    pub fn recv(&self) -> Option<StageOutput<R, V>> {
        self.output.recv().ok()
    }

    /// Waits for the worker thread to exit.
    pub fn join(mut self) -> IndexResult<()> {
        self.close();
        drop(self.output);
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| IndexError::aborted("stage worker panicked")),
            None => Ok(()),
        }
    }

    fn event(&self, event: StageEvent<R>) -> IndexResult<()> {
        let input = self.input.as_ref().ok_or(IndexError::StageClosed)?;
        input.send(event).map_err(|_| IndexError::StageClosed)
    }
}

impl<R, V> std::fmt::Debug for StageHandle<R, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageHandle")
            .field("open", &self.input.is_some())
            .field("running", &self.worker.is_some())
            .finish()
    }
}
