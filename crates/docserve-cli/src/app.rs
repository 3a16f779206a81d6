//! Wires settings, caches, handler and server together

use anyhow::Context;
use docserve_cache::{ByteCache, CacheStatistics, MAX_RECORD_SIZE};
use docserve_conf::Settings;
use docserve_server::{HttpServer, ShutdownCoordinator, shutdown_signal};
use docserve_static::StaticFileHandler;
use std::sync::Arc;

/// The two cache tiers shared by every request
pub struct Tiers {
	pub tags: Arc<ByteCache>,
	pub contents: Arc<ByteCache>,
}

impl Tiers {
	pub fn new(settings: &Settings) -> Self {
		let share = settings.content_cache_capacity / settings.cache_buckets;
		if share < MAX_RECORD_SIZE {
			tracing::warn!(
				share,
				max_record = MAX_RECORD_SIZE,
				"content tier buckets are smaller than one chunk; large files will not be cached"
			);
		}

		Self {
			tags: Arc::new(ByteCache::with_buckets(
				settings.tag_cache_capacity,
				settings.cache_buckets,
			)),
			contents: Arc::new(ByteCache::with_buckets(
				settings.content_cache_capacity,
				settings.cache_buckets,
			)),
		}
	}

	pub fn log_statistics(&self) {
		log_tier("tag", &self.tags.statistics());
		log_tier("content", &self.contents.statistics());
	}
}

fn log_tier(tier: &str, stats: &CacheStatistics) {
	tracing::info!(
		tier,
		hits = stats.hits,
		misses = stats.misses,
		hit_rate = format_args!("{:.3}", stats.hit_rate()),
		evictions = stats.evictions,
		entries = stats.entry_count,
		bytes_used = stats.bytes_used,
		capacity = stats.capacity,
		"cache statistics"
	);
}

/// Serve until Ctrl-C or SIGTERM, then drain connections and report
pub async fn run(settings: Settings) -> anyhow::Result<()> {
	let root = tokio::fs::canonicalize(&settings.document_root)
		.await
		.with_context(|| {
			format!(
				"document root {} is not accessible",
				settings.document_root.display()
			)
		})?;
	let metadata = tokio::fs::metadata(&root).await?;
	anyhow::ensure!(
		metadata.is_dir(),
		"document root {} is not a directory",
		root.display()
	);

	let tiers = Tiers::new(&settings);
	let handler = StaticFileHandler::new(&root, Arc::clone(&tiers.tags), Arc::clone(&tiers.contents));
	tracing::info!(
		root = %root.display(),
		tag_capacity = settings.tag_cache_capacity,
		content_capacity = settings.content_cache_capacity,
		buckets = settings.cache_buckets,
		"serving static files"
	);

	let coordinator = ShutdownCoordinator::new(settings.shutdown_timeout());
	let server = HttpServer::new(Arc::new(handler));
	let mut server_task = tokio::spawn(
		server.listen_with_shutdown(settings.bind_address, coordinator.clone()),
	);

	let stopped_early = tokio::select! {
		result = &mut server_task => Some(result),
		_ = shutdown_signal() => None,
	};

	match stopped_early {
		Some(result) => {
			result
				.context("server task panicked")?
				.context("server stopped")?;
		}
		None => {
			coordinator.shutdown();
			server_task
				.await
				.context("server task panicked")?
				.context("server stopped")?;
			if coordinator.wait_for_shutdown().await {
				tracing::info!("all connections closed");
			}
		}
	}

	tiers.log_statistics();
	Ok(())
}
