use parking_lot::Mutex;
use spark_dodge::{CalibrationConstant, Measurementor, ResponseTable};
use spark_guide::environment::read_environmental_model;
use spark_guide::pipeline::FramePipeline;
use spark_guide::runner::{run, RunSettings};
use spark_guide::service::{Announcer, Services};
use spark_guide::source::{CaptureError, Frame, FrameSource, ReplayFeed};
use std::future::{pending, ready};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const SIDE: &str = "[[0,190],[200,190],[0,340],[200,340]]";
const FEET: &str = "[[250,200],[380,200],[250,360],[380,360]]";

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Announcer for Recorder {
    fn announce(&mut self, phrase: &str) {
        self.0.lock().push(phrase.to_string());
    }
}

/// Fails every read and reports when it has been dropped.
struct BrokenCamera(Arc<AtomicBool>);

impl FrameSource for BrokenCamera {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        Err(CaptureError::ReadFailed(0))
    }
}

impl Drop for BrokenCamera {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn pipeline() -> FramePipeline {
    let constant = CalibrationConstant::from_focal_length(30.0, 6000.0).unwrap();
    FramePipeline::new(Measurementor::new(constant), 90, ResponseTable::default())
}

fn settings(max_frames: Option<u64>) -> RunSettings {
    RunSettings {
        max_consecutive_failures: 3,
        retry_delay: Duration::ZERO,
        guidance_pause: Duration::ZERO,
        frame_budget: Duration::from_secs(5),
        max_frames,
    }
}

fn feed(frames: &[&str]) -> ReplayFeed {
    let json = format!(
        r#"{{"width": 630, "height": 360, "frames": [{}]}}"#,
        frames.join(",")
    );
    ReplayFeed::from_json(&json).unwrap()
}

fn services(dir: &Path, recorder: &Recorder) -> Services {
    Services::start(dir.join("environmentalModel.json"), recorder.clone(), 4)
}

#[tokio::test]
async fn replay_runs_to_the_end_of_the_recording() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let services = services(dir.path(), &recorder);
    let (camera, detector) = feed(&[&format!("[{SIDE}]"), "[]", "null", &format!("[{FEET}]")]).split();

    let summary = run(camera, detector, &pipeline(), &services, &settings(None), pending::<()>())
        .await
        .unwrap();
    services.shutdown().await;

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.guided, 2);
    assert_eq!(summary.blocked, 1);
    assert_eq!(summary.capture_failures, 1);
    assert_eq!(
        *recorder.0.lock(),
        vec![
            "Obstacle about half a meter ahead".to_string(),
            "Stop, there is no safe way forward".to_string(),
        ]
    );

    // the model holds the last frame with obstacles
    let model = read_environmental_model(dir.path().join("environmentalModel.json")).unwrap();
    assert_eq!(model.len(), 1);
    assert_eq!((model[0].width, model[0].height), (130, 160));
}

#[tokio::test]
async fn frame_limit_stops_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let services = services(dir.path(), &recorder);
    let (camera, detector) = feed(&["[]", "[]", "[]"]).split();

    let summary = run(camera, detector, &pipeline(), &services, &settings(Some(2)), pending::<()>())
        .await
        .unwrap();
    services.shutdown().await;

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.guided, 0);
    assert!(recorder.0.lock().is_empty());
}

#[tokio::test]
async fn shutdown_before_the_first_frame_processes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let services = services(dir.path(), &recorder);
    let (camera, detector) = feed(&[&format!("[{SIDE}]")]).split();

    let summary = run(camera, detector, &pipeline(), &services, &settings(None), ready(()))
        .await
        .unwrap();
    services.shutdown().await;

    assert_eq!(summary.frames, 0);
    assert!(!dir.path().join("environmentalModel.json").exists());
}

#[tokio::test]
async fn isolated_capture_failures_are_retried() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let services = services(dir.path(), &recorder);
    let (camera, detector) = feed(&["null", "null", "[]", "null", "null", "[]"]).split();

    let summary = run(camera, detector, &pipeline(), &services, &settings(None), pending::<()>())
        .await
        .unwrap();
    services.shutdown().await;

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.capture_failures, 4);
}

#[tokio::test]
async fn planning_failures_skip_the_frame_and_keep_running() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let services = services(dir.path(), &recorder);
    let side = format!("[{SIDE}]");
    let (camera, detector) = feed(&[&side, &side, &side]).split();

    let constant = CalibrationConstant::from_focal_length(30.0, 6000.0).unwrap();
    let unplannable = FramePipeline::new(Measurementor::new(constant), 0, ResponseTable::default());

    let summary = run(camera, detector, &unplannable, &services, &settings(None), pending::<()>())
        .await
        .unwrap();
    services.shutdown().await;

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.skipped, 3);
    assert_eq!(summary.guided, 0);
    assert!(recorder.0.lock().is_empty());
}

#[tokio::test]
async fn repeated_capture_failures_are_fatal_and_release_the_camera() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::default();
    let services = services(dir.path(), &recorder);
    let released = Arc::new(AtomicBool::new(false));
    let (_, detector) = feed(&[]).split();

    let err = run(
        BrokenCamera(released.clone()),
        detector,
        &pipeline(),
        &services,
        &settings(None),
        pending::<()>(),
    )
    .await
    .unwrap_err();
    services.shutdown().await;

    assert!(format!("{err:#}").contains("3 times in a row"));
    assert!(released.load(Ordering::SeqCst));
}
