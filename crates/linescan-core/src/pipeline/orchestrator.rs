use ndarray::Array2;
use tracing::{info, warn};

use crate::calibrate::{apply_calibration, estimate_calibration};
use crate::detect::{detect_lines_in_frame, DetectionConfig};
use crate::error::{LinescanError, Result};
use crate::frame::{uniform_dim, Frame};
use crate::geometry::{FixedPoints, LineFamily, PointPicker};
use crate::mask::{subtract_background_cached, MaskCache};

use super::config::{LineSource, PipelineConfig};
use super::types::{CalibrationOutput, PipelineStage, ProgressReporter, SubtractionOutput};

/// Split a direction-major stack into one sub-sequence per scan direction.
///
/// With `steps_per_direction` unset the stack must divide evenly. Frames
/// beyond `directions * steps` are dropped with a warning.
pub fn split_directions(
    frames: &[Frame],
    steps_per_direction: Option<usize>,
    directions: usize,
) -> Result<Vec<&[Frame]>> {
    if directions == 0 {
        return Err(LinescanError::InvalidInput(
            "at least one scan direction is required".into(),
        ));
    }
    let steps = match steps_per_direction {
        Some(steps) => steps,
        None => {
            if frames.len() % directions != 0 {
                return Err(LinescanError::FrameCountMismatch(format!(
                    "{} frames do not split evenly into {directions} directions",
                    frames.len()
                )));
            }
            frames.len() / directions
        }
    };
    if steps == 0 {
        return Err(LinescanError::InvalidInput(
            "steps per direction must be at least 1".into(),
        ));
    }
    let needed = steps * directions;
    if needed > frames.len() {
        return Err(LinescanError::FrameCountMismatch(format!(
            "{directions} directions of {steps} steps need {needed} frames, stack has {}",
            frames.len()
        )));
    }
    if needed < frames.len() {
        warn!(
            dropped = frames.len() - needed,
            used = needed,
            "Frames beyond {directions} directions of {steps} steps are ignored"
        );
    }
    Ok(frames[..needed].chunks(steps).collect())
}

/// Build a line family from three points chosen on `frame`.
pub fn family_from_picker(
    picker: &mut impl PointPicker,
    frame: &Frame,
    lines_per_interval: u32,
) -> Result<LineFamily> {
    let [p1, p2, p3] = picker.pick_three_points(frame)?;
    LineFamily::from_three_points(p1, p2, p3, lines_per_interval)
}

/// Resolve the line family of one scan direction from its first frame.
pub fn resolve_family(
    source: &LineSource,
    reference: &Frame,
    detection: &DetectionConfig,
) -> Result<LineFamily> {
    let family = match source {
        LineSource::Points {
            points,
            lines_per_interval,
            ..
        } => {
            let mut picker = FixedPoints::parse(points)?;
            family_from_picker(&mut picker, reference, *lines_per_interval)?
        }
        LineSource::Detect { .. } => detect_lines_in_frame(reference, detection)?,
    };
    info!(%source, %family, "Line family resolved");
    Ok(family)
}

fn direction_sequences<'a>(
    frames: &'a [Frame],
    config: &PipelineConfig,
) -> Result<Vec<&'a [Frame]>> {
    uniform_dim(frames)?;
    split_directions(frames, config.steps_per_direction, config.directions.len())
}

fn resolve_families(
    sequences: &[&[Frame]],
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<LineFamily>> {
    reporter.begin_stage(PipelineStage::LineFitting, Some(sequences.len()));
    let mut families = Vec::with_capacity(sequences.len());
    for (i, (sequence, source)) in sequences.iter().zip(&config.directions).enumerate() {
        // split_directions never yields an empty chunk
        let reference = sequence.first().ok_or(LinescanError::EmptySequence)?;
        families.push(resolve_family(source, reference, &config.detection)?);
        reporter.advance(i + 1);
    }
    reporter.finish_stage();
    Ok(families)
}

/// Estimate flat-field factors for every scan direction of a
/// black-level-subtracted stack.
pub fn run_calibration(
    frames: &[Frame],
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<CalibrationOutput> {
    let sequences = direction_sequences(frames, config)?;
    info!(
        frames = frames.len(),
        directions = sequences.len(),
        "Starting calibration"
    );
    let families = resolve_families(&sequences, config, reporter)?;

    reporter.begin_stage(PipelineStage::Calibrating, Some(sequences.len()));
    let mut calibrations = Vec::with_capacity(sequences.len());
    for (i, ((sequence, family), source)) in sequences
        .iter()
        .zip(&families)
        .zip(&config.directions)
        .enumerate()
    {
        calibrations.push(estimate_calibration(
            sequence,
            family,
            source.direction(),
            &config.calibration,
        )?);
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    Ok(CalibrationOutput {
        families,
        calibrations,
    })
}

/// Run on/off background subtraction for every scan direction and sum the
/// per-direction results.
pub fn run_subtraction(
    frames: &[Frame],
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<SubtractionOutput> {
    let mut cache = MaskCache::new(config.masks.clone())?;
    run_subtraction_cached(frames, config, &mut cache, reporter)
}

/// [`run_subtraction`] with masks drawn from a cache that outlives the call,
/// so later stacks of the same geometry skip mask construction.
pub fn run_subtraction_cached(
    frames: &[Frame],
    config: &PipelineConfig,
    cache: &mut MaskCache,
    reporter: &dyn ProgressReporter,
) -> Result<SubtractionOutput> {
    if cache.config() != &config.masks {
        return Err(LinescanError::InvalidInput(
            "mask cache was built for a different mask configuration".into(),
        ));
    }
    let dim = uniform_dim(frames)?;
    let sequences = direction_sequences(frames, config)?;
    info!(
        frames = frames.len(),
        directions = sequences.len(),
        mode = %config.subtraction.mode,
        cached_masks = cache.len(),
        "Starting background subtraction"
    );
    let families = resolve_families(&sequences, config, reporter)?;

    reporter.begin_stage(PipelineStage::Subtracting, Some(sequences.len()));
    let mut composite = Array2::<f32>::zeros(dim);
    let mut directions = Vec::with_capacity(sequences.len());
    for (i, ((sequence, family), source)) in sequences
        .iter()
        .zip(&families)
        .zip(&config.directions)
        .enumerate()
    {
        let subtraction = subtract_background_cached(
            sequence,
            family,
            source.direction(),
            &config.subtraction,
            cache,
        )?;
        composite += &subtraction.result;
        directions.push(subtraction);
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    Ok(SubtractionOutput {
        families,
        directions,
        composite,
    })
}

/// Apply a factor stack to a frame stack, one frame at a time.
pub fn run_apply_calibration(
    frames: &[Frame],
    factors: &[Array2<f32>],
    reporter: &dyn ProgressReporter,
) -> Result<Vec<Frame>> {
    if frames.is_empty() {
        return Err(LinescanError::EmptySequence);
    }
    if frames.len() != factors.len() {
        return Err(LinescanError::FrameCountMismatch(format!(
            "{} frames but {} calibration maps",
            frames.len(),
            factors.len()
        )));
    }

    reporter.begin_stage(PipelineStage::ApplyingCalibration, Some(frames.len()));
    let mut calibrated = Vec::with_capacity(frames.len());
    for (i, (frame, factor)) in frames.iter().zip(factors).enumerate() {
        calibrated.extend(apply_calibration(
            std::slice::from_ref(frame),
            std::slice::from_ref(factor),
        )?);
        reporter.advance(i + 1);
    }
    reporter.finish_stage();
    Ok(calibrated)
}
