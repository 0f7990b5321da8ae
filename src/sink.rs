//! Delivery of decoded feeds.
use reqwest::blocking::Client;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::router::DecodedFeed;

pub trait Sink: Send {
    fn deliver(&mut self, feed: &DecodedFeed) -> Result<()>;

    /// Flush anything buffered. Called once after the last delivery.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonLinesSink<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        JsonLinesSink { out, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Sink for JsonLinesSink<W> {
    fn deliver(&mut self, feed: &DecodedFeed) -> Result<()> {
        serde_json::to_writer(&mut self.out, feed)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// POSTs each feed as JSON. A non-2xx status is an error; there are no retries.
pub struct HttpSink {
    client: Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpSink { client, endpoint: endpoint.into() })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Sink for HttpSink {
    fn deliver(&mut self, feed: &DecodedFeed) -> Result<()> {
        let resp = self.client.post(&self.endpoint).json(feed).send()?.error_for_status()?;
        debug!(status = resp.status().as_u16(), url = feed.url.as_str(), "delivered");
        Ok(())
    }
}

/// Fans a feed out to several sinks; stops at the first failure.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Box<dyn Sink>>,
}

impl Fanout {
    pub fn push(&mut self, sink: impl Sink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Sink for Fanout {
    fn deliver(&mut self, feed: &DecodedFeed) -> Result<()> {
        for sink in &mut self.sinks {
            sink.deliver(feed)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        for sink in &mut self.sinks {
            sink.finish()?;
        }
        Ok(())
    }
}
