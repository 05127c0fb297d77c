pub mod cancel;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod snapshot;

pub use cancel::CancelToken;
pub use snapshot::Snapshot;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use rusqlite::{Connection, OpenFlags};
use tracing::info;

const READERS: usize = 4;

struct Pool {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
}

impl Pool {
    fn next_reader(&self) -> Option<&Mutex<Connection>> {
        if self.readers.is_empty() {
            return None;
        }
        let idx = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        Some(&self.readers[idx])
    }
}

/// Handle on the forum store. Clones share the same connections.
///
/// In-memory stores live on a single connection, so they have no readers and
/// every call goes through the writer.
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool>,
    cancel: Option<Arc<CancelToken>>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let writer = Connection::open(path)?;
        writer.pragma_update(None, "journal_mode", "WAL")?;
        migrations::run(&writer)?;

        let readers = (0..READERS)
            .map(|_| {
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                Ok(Mutex::new(conn))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(path = %path.display(), readers = READERS, "store opened");
        Ok(Self::from_connections(writer, readers))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;

        info!("in-memory store opened");
        Ok(Self::from_connections(conn, Vec::new()))
    }

    fn from_connections(writer: Connection, readers: Vec<Mutex<Connection>>) -> Self {
        Self {
            pool: Arc::new(Pool {
                writer: Mutex::new(writer),
                readers,
                next_reader: AtomicUsize::new(0),
            }),
            cancel: None,
        }
    }

    /// A handle whose calls give way to `token`: refused once it is cancelled,
    /// interrupted if it is cancelled mid-statement.
    pub fn cancellable(&self, token: Arc<CancelToken>) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            cancel: Some(token),
        }
    }

    /// Run `f` on a read-only connection, round-robin over the readers.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let Some(reader) = self.pool.next_reader() else {
            return self.with_conn_mut(f);
        };
        let conn = reader.lock().map_err(|_| anyhow!("reader connection poisoned"))?;
        self.enter(&conn, f)
    }

    /// Run `f` on the writer.
    ///
    /// SQLite takes one writer at a time, so writes queue on this mutex
    /// instead of failing with `SQLITE_BUSY`.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .pool
            .writer
            .lock()
            .map_err(|_| anyhow!("writer connection poisoned"))?;
        self.enter(&conn, f)
    }

    fn enter<F, T>(&self, conn: &Connection, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let _running = match &self.cancel {
            Some(token) => Some(token.begin(conn)?),
            None => None,
        };
        f(conn)
    }
}
