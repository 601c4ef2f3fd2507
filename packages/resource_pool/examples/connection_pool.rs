//! A database connection pool with a capacity of three:
//!
//! * Acquiring connections constructs them lazily.
//! * A released connection is reused by the next acquire.
//! * Acquiring beyond capacity fails instead of blocking.
//!
//! Set `RUST_LOG=resource_pool=trace` to see what the pool is doing.

use std::error::Error;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use resource_pool::{AcquireError, Resource, ResourcePool};
use tracing_subscriber::EnvFilter;

struct DatabaseConnection {
    id: u32,
}

impl DatabaseConnection {
    fn open(id: u32) -> io::Result<Self> {
        println!("Creating new DatabaseConnection: conn_{id}");

        // Connection setup is the expensive part we want to avoid repeating.
        thread::sleep(Duration::from_millis(100));

        Ok(Self { id })
    }

    fn query(&self, sql: &str) -> String {
        format!("Executing query '{sql}' with connection conn_{}", self.id)
    }
}

impl Resource for DatabaseConnection {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let next_id = AtomicU32::new(1);
    let pool = ResourcePool::new(3, move || {
        DatabaseConnection::open(next_id.fetch_add(1, Ordering::Relaxed))
    });

    let conn1 = pool.acquire()?;
    println!("{}", conn1.query("SELECT * FROM users"));

    let conn2 = pool.acquire()?;
    println!("{}", conn2.query("INSERT INTO products VALUES (...)"));

    println!("Releasing connection: conn_{}", conn1.id);
    pool.release(conn1)?;

    // This reuses conn_1.
    let conn3 = pool.acquire()?;
    println!("Reusing existing connection: conn_{}", conn3.id);
    println!("{}", conn3.query("UPDATE orders SET status = 'shipped'"));

    // This creates conn_3.
    let conn4 = pool.acquire()?;
    println!("{}", conn4.query("DELETE FROM temp_data"));

    match pool.acquire() {
        Err(AcquireError::PoolExhausted { max_size }) => {
            println!("Error: maximum pool size of {max_size} reached, no available connections");
        }
        Err(e) => return Err(e.into()),
        Ok(_) => unreachable!("all three connections are checked out"),
    }

    // Guards return their connection to the pool automatically.
    pool.release(conn4)?;
    {
        let conn = pool.checkout()?;
        println!("{}", conn.query("SELECT 1"));
    }

    println!("Pool status at exit: {:?}", pool.status());

    pool.release(conn2)?;
    pool.release(conn3)?;

    Ok(())
}
