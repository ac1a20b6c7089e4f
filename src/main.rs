use seatcast::api;
use seatcast::calendar::CalendarPeriods;
use seatcast::config;
use seatcast::store::memory::{self, InMemoryEventStore};
use seatcast::survival::SurvivalEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt().with_target(false).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        "seatcast starting"
    );
    let config = config::load_default()?;

    // Load the occupancy event snapshot
    let store = match config.snapshot_path() {
        Some(path) => match memory::load_from_path(path) {
            Ok(store) => {
                tracing::info!(path = %path.display(), events = store.len(), "Event snapshot loaded");
                store
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load event snapshot, starting empty");
                InMemoryEventStore::default()
            }
        },
        None => {
            tracing::warn!("No event snapshot configured, starting empty");
            InMemoryEventStore::default()
        }
    };

    if store.is_empty() {
        tracing::warn!("Event store is empty - predictions will use the default curve");
    }

    let calendar = CalendarPeriods::new(config.calendar_periods());
    let engine = Arc::new(SurvivalEngine::new(
        Box::new(store),
        Box::new(calendar),
        config.prediction_params(),
    ));

    // Start the periodic cache refresh thread (the scheduler trigger)
    let stop_flag = Arc::new(AtomicBool::new(false));
    let _refresh_handle = spawn_cache_refresh_thread(
        Arc::clone(&engine),
        Arc::clone(&stop_flag),
        config.cache_refresh_interval(),
    );

    let app = api::router(Arc::clone(&engine));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    // Signal refresh thread to stop
    stop_flag.store(true, Ordering::Relaxed);

    Ok(())
}

/// Spawn the periodic cache-refresh thread. Curves rebuild lazily on the
/// next prediction after each clear.
fn spawn_cache_refresh_thread(
    engine: Arc<SurvivalEngine>,
    stop: Arc<AtomicBool>,
    interval: Duration,
) -> std::thread::JoinHandle<()> {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Starting cache refresh thread"
    );
    std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();
            sleep_with_stop(interval, &stop, cycle_start);
            if stop.load(Ordering::Relaxed) {
                break;
            }

            if let Err(e) = engine.refresh_cache() {
                tracing::warn!("Error refreshing curve cache: {}", e);
            }
        }
    })
}

fn sleep_with_stop(duration: Duration, stop: &AtomicBool, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed >= duration {
        return;
    }
    let remaining = duration - elapsed;
    let step = Duration::from_millis(100);
    let mut slept = Duration::ZERO;

    while slept < remaining {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(step);
        slept += step;
    }
}
