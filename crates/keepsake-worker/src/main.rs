use anyhow::Context;
use keepsake_core::Config;
use keepsake_db::{
    AssetRepository, FaceRepository, LocationRepository, PlaceRepository,
    ProcessingStatusRepository,
};
use keepsake_infra::init_telemetry;
use keepsake_processing::{
    CommandFaceEngine, ExifToolProbe, FfmpegFrameExtractor, FfmpegTranscoder, NominatimGeocoder,
};
use keepsake_storage::{SignedUrlCache, StorageFactory};
use keepsake_worker::setup::setup_database;
use keepsake_worker::{Pipeline, PipelineConfig, TaskDependencies, TaskRegistry};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

/// Signed URLs handed out elsewhere stay valid this long; cached entries follow.
const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    config.validate()?;

    init_telemetry(config.json_logs(), "keepsake-worker")?;
    tracing::info!(environment = %config.environment(), "Starting keepsake worker");

    let pool = setup_database(&config).await?;
    let assets = Arc::new(AssetRepository::new(pool.clone()));
    let statuses = Arc::new(ProcessingStatusRepository::new(pool.clone()));

    let geocoder = NominatimGeocoder::new(
        config.geocoder_url(),
        config.geocoder_user_agent(),
        config.geocoder_min_interval(),
        config.geocoder_timeout(),
    )?;
    let capacity = NonZeroUsize::new(config.signed_url_cache_capacity())
        .context("SIGNED_URL_CACHE_CAPACITY must be greater than 0")?;

    let registry = TaskRegistry::standard(TaskDependencies {
        assets: assets.clone(),
        locations: Arc::new(LocationRepository::new(pool.clone())),
        places: Arc::new(PlaceRepository::new(pool.clone())),
        faces: Arc::new(FaceRepository::new(pool)),
        geocoder: Arc::new(geocoder),
        probe: Arc::new(ExifToolProbe::new(
            config.exiftool_path(),
            config.probe_timeout(),
        )),
        transcoder: Arc::new(FfmpegTranscoder::new(
            config.ffmpeg_path(),
            config.transcode_timeout(),
        )),
        frames: Arc::new(FfmpegFrameExtractor::new(
            config.ffmpeg_path(),
            config.thumbnail_timeout(),
        )),
        face_engine: Arc::new(CommandFaceEngine::new(
            config.face_detect_path(),
            config.face_detect_timeout(),
        )),
        url_cache: Arc::new(SignedUrlCache::new(capacity, SIGNED_URL_TTL)),
        thumbnail_max_width: config.thumbnail_max_width(),
    })?;

    let pipeline = Pipeline::new(
        Arc::new(registry),
        assets,
        statuses,
        Arc::new(StorageFactory::new(config.staging_dir().clone())),
        PipelineConfig::from_config(&config),
    );

    pipeline.run().await;
    Ok(())
}
