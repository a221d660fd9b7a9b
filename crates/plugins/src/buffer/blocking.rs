//! BlockingBuffer - in-memory bounded buffer
//!
//! Backed by a bounded multi-consumer channel: the source task blocks when
//! the buffer is full (backpressure), and every processor worker reads from
//! the same queue.

use std::time::Duration;

use async_channel::{bounded, Receiver, Sender, TryRecvError};

use contracts::{Batch, Buffer, EventRecord, PipelineError};

/// In-memory bounded buffer between the source and the processor workers
pub struct BlockingBuffer {
    tx: Sender<EventRecord>,
    rx: Receiver<EventRecord>,
    batch_size: usize,
}

impl BlockingBuffer {
    /// Create a buffer holding at most `capacity` records, returning at most
    /// `batch_size` records per read
    pub fn new(capacity: usize, batch_size: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self {
            tx,
            rx,
            batch_size: batch_size.max(1),
        }
    }

    /// Records currently buffered
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[async_trait::async_trait]
impl Buffer for BlockingBuffer {
    async fn write(&self, record: EventRecord) -> Result<(), PipelineError> {
        self.tx
            .send(record)
            .await
            .map_err(|_| PipelineError::buffer_write("buffer channel closed"))
    }

    async fn read_batch(&self, timeout: Duration) -> Batch {
        let mut batch = Vec::new();

        // block up to the timeout for the first record
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Ok(record)) => batch.push(record),
            Ok(Err(_)) | Err(_) => return batch,
        }

        // then drain whatever is immediately available
        while batch.len() < self.batch_size {
            match self.rx.try_recv() {
                Ok(record) => batch.push(record),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use contracts::{Event, Record};

    use super::*;

    fn record(seq: i64) -> EventRecord {
        let mut event = Event::new();
        event.put("seq", seq);
        Record::new(event)
    }

    #[tokio::test]
    async fn test_read_batch_preserves_write_order() {
        let buffer = BlockingBuffer::new(10, 10);
        for seq in 0..3 {
            buffer.write(record(seq)).await.unwrap();
        }

        let batch = buffer.read_batch(Duration::from_millis(50)).await;
        let seqs: Vec<i64> = batch
            .iter()
            .map(|r| r.data().get("seq").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_timed_out_read_returns_empty_batch() {
        let buffer = BlockingBuffer::new(10, 10);
        let batch = buffer.read_batch(Duration::from_millis(20)).await;
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_read_batch_respects_batch_size() {
        let buffer = BlockingBuffer::new(10, 2);
        for seq in 0..5 {
            buffer.write(record(seq)).await.unwrap();
        }

        let batch = buffer.read_batch(Duration::from_millis(50)).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(buffer.len(), 3);
    }

    #[tokio::test]
    async fn test_write_all_in_order() {
        let buffer = BlockingBuffer::new(10, 10);
        buffer
            .write_all(vec![record(1), record(2)])
            .await
            .unwrap();
        assert_eq!(buffer.len(), 2);
    }
}
