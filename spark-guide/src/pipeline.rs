use crate::environment::{records, EnvironmentalRecord};
use crate::source::{Frame, RawDetection};
use log::{debug, warn};
use spark_dodge::{
    generate_maze, BoundingBox, DirectionPlan, DodgeStatus, Dodger, ForwardFirst, Guidance,
    MazeError, Measurementor, MovePolicy, ObstacleFilter, OccupancyGrid, ResponseTable,
};

/// Everything one frame produced, from the surviving obstacles to the phrase
/// handed to the announcer.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub sequence: u64,
    pub detected: usize,
    /// Filtered and measured, in detector order.
    pub obstacles: Vec<BoundingBox>,
    /// Obstacles discarded because they could not be measured.
    pub dropped: usize,
    pub plan: Option<PlanReport>,
}

#[derive(Debug, Clone)]
pub struct PlanReport {
    pub grid: OccupancyGrid,
    pub status: DodgeStatus,
    pub directions: DirectionPlan,
    pub rendering: String,
    pub guidance: Guidance,
    pub phrase: String,
}

impl FrameReport {
    pub fn records(&self) -> Vec<EnvironmentalRecord> {
        records(&self.obstacles)
    }
}

/// Filter, measure, build the maze and plan, for one frame at a time.
pub struct FramePipeline<P = ForwardFirst> {
    measurementor: Measurementor,
    resolution: u32,
    responses: ResponseTable,
    policy: P,
}

impl FramePipeline {
    pub fn new(measurementor: Measurementor, resolution: u32, responses: ResponseTable) -> Self {
        Self::with_policy(measurementor, resolution, responses, ForwardFirst)
    }
}

impl<P: MovePolicy + Clone> FramePipeline<P> {
    pub fn with_policy(
        measurementor: Measurementor,
        resolution: u32,
        responses: ResponseTable,
        policy: P,
    ) -> Self {
        Self {
            measurementor,
            resolution,
            responses,
            policy,
        }
    }

    pub fn process(
        &self,
        frame: &Frame,
        detections: Vec<RawDetection>,
    ) -> Result<FrameReport, MazeError> {
        let detected = detections.len();
        let boxes = detections.into_iter().map(BoundingBox::from_corners).collect();
        let candidates = ObstacleFilter::new(frame.width, frame.height).apply(boxes);

        let mut obstacles = Vec::with_capacity(candidates.len());
        let mut dropped = 0;
        for mut bbox in candidates {
            match self.measurementor.measure_box(&mut bbox) {
                Ok(_) => obstacles.push(bbox),
                Err(err) => {
                    warn!("Dropping obstacle {bbox} in frame {}: {err}", frame.sequence);
                    dropped += 1;
                }
            }
        }
        debug!(
            "Frame {}: {} detected, {} kept, {} dropped",
            frame.sequence,
            detected,
            obstacles.len(),
            dropped
        );

        let plan = if obstacles.is_empty() {
            None
        } else {
            Some(self.plan(frame, &obstacles)?)
        };

        Ok(FrameReport {
            sequence: frame.sequence,
            detected,
            obstacles,
            dropped,
            plan,
        })
    }

    fn plan(&self, frame: &Frame, obstacles: &[BoundingBox]) -> Result<PlanReport, MazeError> {
        // the walkable zone is the lower half of the frame
        let height = frame.height / 2;
        let grid = generate_maze(obstacles, height, frame.width, height, self.resolution)?;

        let mut dodger = Dodger::with_policy(&grid, self.policy.clone());
        let status = dodger.calculate();
        let directions = dodger.directions().clone();
        let rendering = dodger.render();

        let guidance = Guidance::from_plan(status, &directions, grid.nearest_distance());
        let phrase = self.responses.phrase(&guidance);

        Ok(PlanReport {
            grid,
            status,
            directions,
            rendering,
            guidance,
            phrase,
        })
    }
}
