//! NimbusKV Server Binary
//!
//! Builds a server, starts the active-expiry sweeper and drives a
//! concurrent synthetic workload against it, then reports keyspace stats.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use nimbuskv::{Config, Object, Server, Sweeper};
use tracing_subscriber::{fmt, EnvFilter};

/// NimbusKV Server
#[derive(Parser, Debug)]
#[command(name = "nimbuskv-server")]
#[command(about = "In-memory multi-database keyspace engine")]
#[command(version)]
struct Args {
    /// Number of databases
    #[arg(short, long, default_value = "16")]
    databases: usize,

    /// Active expiry sweep interval in milliseconds
    #[arg(short, long, default_value = "100")]
    sweep_interval_ms: u64,

    /// Worker threads in the synthetic workload
    #[arg(short, long, default_value = "4")]
    threads: usize,

    /// Operations per worker thread
    #[arg(short, long, default_value = "100000")]
    ops: usize,

    /// Distinct keys per database
    #[arg(short, long, default_value = "1000")]
    keys: usize,

    /// TTL (seconds) set by the workload's expire step; 0 disables
    #[arg(long, default_value = "1")]
    ttl: i64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nimbuskv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("NimbusKV Server v{}", nimbuskv::VERSION);

    // Build config from args
    let config = Config::builder()
        .databases(args.databases)
        .sweep_interval_ms(args.sweep_interval_ms)
        .initial_capacity(args.keys)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let server = Arc::new(Server::with_config(&config));

    let sweeper = match Sweeper::spawn(
        Arc::clone(&server),
        Duration::from_millis(config.sweep_interval_ms),
    ) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start sweeper: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Running {} threads x {} ops over {} databases",
        args.threads,
        args.ops,
        server.database_count()
    );

    let started = Instant::now();
    let handles: Vec<_> = (0..args.threads)
        .map(|worker| {
            let server = Arc::clone(&server);
            let (ops, keys, ttl) = (args.ops, args.keys.max(1), args.ttl);
            thread::spawn(move || run_worker(&server, worker, ops, keys, ttl))
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            tracing::error!("Worker thread panicked");
        }
    }

    let elapsed = started.elapsed();
    let total_ops = args.threads * args.ops;
    tracing::info!(
        "Completed {} ops in {:.2?} ({:.0} ops/s)",
        total_ops,
        elapsed,
        total_ops as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    for stats in server.info() {
        tracing::info!("{}", stats);
    }

    let evicted = sweeper.stop();
    tracing::info!("Sweeper evicted {} keys; {} keys live", evicted, server.total_keys());
}

/// Mixed set/get/expire/delete workload over one database per worker
fn run_worker(server: &Server, worker: usize, ops: usize, keys: usize, ttl: i64) {
    let db = match server.database_at(worker % server.database_count()) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Worker {}: {}", worker, e);
            return;
        }
    };

    for i in 0..ops {
        let key = format!("key:{}", (i * 7 + worker) % keys);
        match i % 10 {
            0..=3 => db.set(key.as_str(), Object::string(format!("value-{i}"))),
            4..=7 => {
                let _ = db.get(&key);
            }
            8 => {
                if ttl > 0 {
                    db.expire_in(&key, ttl);
                }
            }
            _ => {
                db.delete(&key);
            }
        }
    }
}
