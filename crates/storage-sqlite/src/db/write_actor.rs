//! Single-writer actor serializing all database writes.
//!
//! Each job runs inside an immediate transaction on a dedicated thread; the
//! whole job rolls back when it returns an error.

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::any::Any;
use std::thread;
use tokio::sync::{mpsc, oneshot};

use crisiscleanup_core::errors::{DatabaseError, Error, Result};

use crate::errors::StorageError;

type BoxedOutput = Box<dyn Any + Send>;
type WriteJob =
    Box<dyn FnOnce(&mut SqliteConnection) -> std::result::Result<BoxedOutput, StorageError> + Send>;

struct WriteRequest {
    job: WriteJob,
    reply: oneshot::Sender<std::result::Result<BoxedOutput, StorageError>>,
}

/// Cloneable handle submitting jobs to the writer thread.
#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::UnboundedSender<WriteRequest>,
}

/// Spawn the writer thread for a pool.
pub fn spawn_writer(pool: Pool<ConnectionManager<SqliteConnection>>) -> WriteHandle {
    let (sender, mut receiver) = mpsc::unbounded_channel::<WriteRequest>();
    thread::Builder::new()
        .name("db-writer".to_string())
        .spawn(move || {
            while let Some(request) = receiver.blocking_recv() {
                let outcome = match pool.get() {
                    Ok(mut conn) => conn
                        .immediate_transaction::<BoxedOutput, StorageError, _>(|tx| {
                            (request.job)(tx)
                        }),
                    Err(err) => Err(StorageError::Pool(err)),
                };
                let _ = request.reply.send(outcome);
            }
        })
        .expect("Failed to spawn database writer thread");
    WriteHandle { sender }
}

impl WriteHandle {
    /// Run a write job inside a transaction on the writer thread.
    pub async fn exec<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    {
        let (reply, receiver) = oneshot::channel();
        let boxed: WriteJob = Box::new(move |conn| {
            let value = job(conn).map_err(StorageError::Domain)?;
            Ok(Box::new(value) as BoxedOutput)
        });
        self.sender
            .send(WriteRequest { job: boxed, reply })
            .map_err(|_| {
                Error::Database(DatabaseError::Internal(
                    "Database writer is shut down".to_string(),
                ))
            })?;
        let outcome = receiver.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Database writer dropped the reply".to_string(),
            ))
        })?;
        let value = outcome.map_err(Error::from)?;
        value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Write job returned an unexpected type".to_string(),
            ))
        })
    }
}
