//! Line-driven chat feed: JSON chat events in, `#channel text` lines out.

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use tatc_core::{
    config::ChannelConfigs,
    domain::{ChannelName, ChatMessage},
    messaging::ChatSink,
    pipeline::Pipeline,
    Result,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, warn};

/// Writes one `#channel text` line per send.
pub struct LineSink<W> {
    out: Mutex<W>,
}

impl<W> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ChatSink for LineSink<W> {
    async fn send(&self, channel: &ChannelName, text: &str) -> Result<()> {
        let mut out = self.out.lock().await;
        out.write_all(format!("#{channel} {text}\n").as_bytes())
            .await?;
        out.flush().await?;
        Ok(())
    }
}

/// Fans chat events out to one worker per channel, so a channel's messages
/// are handled in arrival order while channels run concurrently.
pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
    channels: Arc<ChannelConfigs>,
    sink: Arc<dyn ChatSink>,
    queues: HashMap<ChannelName, mpsc::UnboundedSender<ChatMessage>>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(
        pipeline: Arc<Pipeline>,
        channels: Arc<ChannelConfigs>,
        sink: Arc<dyn ChatSink>,
    ) -> Self {
        Self {
            pipeline,
            channels,
            sink,
            queues: HashMap::new(),
            workers: Vec::new(),
        }
    }

    pub fn dispatch(&mut self, mut message: ChatMessage) {
        message.channel = ChannelName::new(message.channel.as_str());
        let channel = message.channel.clone();

        let queue = self.queues.entry(channel.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            self.workers.push(tokio::spawn(channel_worker(
                channel.clone(),
                self.pipeline.clone(),
                self.channels.clone(),
                self.sink.clone(),
                rx,
            )));
            tx
        });
        if queue.send(message).is_err() {
            warn!("#{channel}: worker is gone, dropping message");
        }
    }

    /// Close every queue and wait for queued messages to finish.
    pub async fn shutdown(self) {
        drop(self.queues);
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!("channel worker failed: {e}");
            }
        }
    }
}

async fn channel_worker(
    channel: ChannelName,
    pipeline: Arc<Pipeline>,
    channels: Arc<ChannelConfigs>,
    sink: Arc<dyn ChatSink>,
    mut rx: mpsc::UnboundedReceiver<ChatMessage>,
) {
    debug!("#{channel}: worker started");
    while let Some(message) = rx.recv().await {
        let cfg = channels.get(&channel, pipeline.env());
        let pipeline = pipeline.clone();
        // Detection and translation block on disk and network.
        let lines = match tokio::task::spawn_blocking(move || pipeline.handle(&message, &cfg)).await
        {
            Ok(lines) => lines,
            Err(e) => {
                error!("#{channel}: pipeline task failed: {e}");
                continue;
            }
        };
        for line in lines {
            if let Err(e) = sink.send(&channel, &line).await {
                error!("#{channel}: send failed: {e}");
            }
        }
    }
    debug!("#{channel}: worker stopped");
}

/// Read JSON chat events until EOF. Malformed lines are logged and skipped.
pub async fn run<R: AsyncBufRead + Unpin>(reader: R, mut dispatcher: Dispatcher) -> anyhow::Result<()> {
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("reading chat events")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ChatMessage>(line) {
            Ok(message) => dispatcher.dispatch(message),
            Err(e) => warn!("ignoring malformed chat event: {e}"),
        }
    }
    dispatcher.shutdown().await;
    Ok(())
}
