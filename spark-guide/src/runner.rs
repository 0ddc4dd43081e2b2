use crate::config::CaptureConfig;
use crate::pipeline::FramePipeline;
use crate::service::Services;
use crate::source::{CaptureError, Detector, FrameSource};
use crate::timer::Stopwatch;
use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use spark_dodge::{DodgeStatus, MovePolicy};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub max_consecutive_failures: u32,
    pub retry_delay: Duration,
    pub guidance_pause: Duration,
    pub frame_budget: Duration,
    pub max_frames: Option<u64>,
}

impl RunSettings {
    pub fn from_config(capture: &CaptureConfig, max_frames: Option<u64>) -> Self {
        Self {
            max_consecutive_failures: capture.max_consecutive_failures.max(1),
            retry_delay: capture.retry_delay(),
            guidance_pause: capture.guidance_pause(),
            frame_budget: capture.frame_budget(),
            max_frames,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub guided: u64,
    pub blocked: u64,
    /// Frames read but left without guidance because planning failed.
    pub skipped: u64,
    pub capture_failures: u64,
}

/// Drives the frame loop until the source runs dry, `max_frames` is reached
/// or `shutdown` resolves.
///
/// The source is owned by the loop and dropped on every way out, including
/// the error returned once capture has failed too many times in a row.
pub async fn run<S, D, P>(
    source: S,
    mut detector: D,
    pipeline: &FramePipeline<P>,
    services: &Services,
    settings: &RunSettings,
    shutdown: impl Future<Output = ()>,
) -> Result<RunSummary>
where
    S: FrameSource,
    D: Detector,
    P: MovePolicy + Clone,
{
    let mut source = source;
    let mut summary = RunSummary::default();
    let mut consecutive_failures = 0;
    tokio::pin!(shutdown);

    loop {
        if settings.max_frames.is_some_and(|max| summary.frames >= max) {
            info!("Reached the frame limit");
            break;
        }

        // give pending signals a chance before the next read
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = tokio::task::yield_now() => {}
        }

        let frame = match source.read() {
            Ok(frame) => {
                consecutive_failures = 0;
                frame
            }
            Err(CaptureError::Exhausted) => {
                info!("Frame source exhausted");
                break;
            }
            Err(err) => {
                consecutive_failures += 1;
                summary.capture_failures += 1;
                warn!(
                    "Capture failed ({consecutive_failures}/{}): {err}",
                    settings.max_consecutive_failures
                );
                if consecutive_failures >= settings.max_consecutive_failures {
                    return Err(anyhow!(err).context(format!(
                        "camera failed {consecutive_failures} times in a row"
                    )));
                }
                if pause(&mut shutdown, settings.retry_delay).await {
                    break;
                }
                continue;
            }
        };

        let stopwatch = Stopwatch::start();
        let detections = detector.detect(&frame);
        summary.frames += 1;
        let report = match pipeline.process(&frame, detections) {
            Ok(report) => report,
            Err(err) => {
                warn!("Skipping frame {}: {err}", frame.sequence);
                summary.skipped += 1;
                continue;
            }
        };

        if !report.obstacles.is_empty() {
            services.publish_environment(report.records());
        }

        let guided = match report.plan {
            Some(plan) => {
                info!("Frame {}\n{}", report.sequence, plan.rendering);
                if plan.status == DodgeStatus::Blocked {
                    summary.blocked += 1;
                }
                summary.guided += 1;
                services.announce(plan.phrase);
                true
            }
            None => false,
        };

        let elapsed = stopwatch.elapsed();
        debug!("Frame {} took {}s", report.sequence, stopwatch.elapsed_secs());
        if elapsed > settings.frame_budget {
            warn!(
                "Frame {} took {:?}, over the {:?} budget",
                report.sequence, elapsed, settings.frame_budget
            );
        }

        if guided && pause(&mut shutdown, settings.guidance_pause).await {
            break;
        }
    }

    drop(source);
    info!(
        "Processed {} frames, {} with guidance, {} blocked, {} skipped",
        summary.frames, summary.guided, summary.blocked, summary.skipped
    );
    Ok(summary)
}

/// Sleeps for `duration`; true when shutdown arrived first.
async fn pause<F>(shutdown: &mut std::pin::Pin<&mut F>, duration: Duration) -> bool
where
    F: Future<Output = ()>,
{
    if duration.is_zero() {
        return false;
    }

    tokio::select! {
        biased;
        _ = shutdown.as_mut() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}
