//! A pool of workers identified by incrementing ids. Each worker remembers its current task,
//! which is cleared by the reset hook when the worker is released.
//!
//! The pool is shared between threads through an `Arc`.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

use resource_pool::{Resource, ResourcePool};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Worker {
    id: u32,
    current_task: Option<String>,
}

impl Worker {
    fn new(id: u32) -> Self {
        println!("Worker {id} created.");

        Self {
            id,
            current_task: None,
        }
    }

    fn do_work(&mut self, task: &str) {
        self.current_task = Some(task.to_string());
        println!("Worker {} is performing task: {task}", self.id);
    }
}

impl Resource for Worker {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn reset(&mut self) {
        self.current_task = None;
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let next_id = AtomicU32::new(1);
    let pool = Arc::new(ResourcePool::new(4, move || {
        Ok::<_, Infallible>(Worker::new(next_id.fetch_add(1, Ordering::Relaxed)))
    }));

    let mut worker1 = pool.acquire().expect("pool has spare capacity");
    worker1.do_work("Process data batch A");

    let mut worker2 = pool.acquire().expect("pool has spare capacity");
    worker2.do_work("Generate report X");

    for worker in [worker1, worker2] {
        let id = worker.id;
        pool.release(worker).expect("worker was acquired from this pool");
        println!("Worker {id} released and returned to pool.");
    }

    // Reuses worker 2, the most recently released one.
    let mut worker3 = pool.acquire().expect("an idle worker is available");
    println!("Reusing Worker {}.", worker3.id);
    assert_eq!(worker3.current_task, None);
    worker3.do_work("Analyze logs");
    pool.release(worker3).expect("worker was acquired from this pool");

    let handles = ["Resize images", "Send newsletters", "Rebuild index"]
        .into_iter()
        .map(|task| {
            let pool = Arc::clone(&pool);

            thread::spawn(move || {
                let mut worker = pool.checkout().expect("pool has capacity for every thread");
                worker.do_work(task);
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    println!(
        "{} workers exist, {} are idle.",
        pool.len(),
        pool.available_len()
    );
}
