use std::f64::consts::{FRAC_PI_2, TAU};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::consts::{
    DEFAULT_DC_EXCLUSION, DEFAULT_HARMONIC_FACTOR, DEFAULT_HARMONIC_RADIUS,
    DEFAULT_MAX_SUBHARMONIC_RATIO, DEFAULT_MIN_HARMONIC_FRACTION, DEFAULT_MIN_PEAK_RATIO,
    DEFAULT_SEARCH_WINDOW, EPSILON, FREQUENCY_POLISH_ITERATIONS, SUBHARMONIC_ORDERS,
};
use crate::error::{LinescanError, Result};
use crate::frame::Frame;
use crate::geometry::{symmetric_remainder, Line, LineFamily};

use super::spectrum::{dft_at, Spectrum};
use super::subpixel::{polish_peak, refine_peak_paraboloid};

/// Parameters for frequency-domain line detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Extent of the low-frequency search window, in bins.
    pub search_window: usize,
    /// Bins around DC excluded from the fundamental search.
    pub dc_exclusion: usize,
    /// Harmonic multiple used for sub-bin refinement (1 disables it).
    pub harmonic_factor: usize,
    /// Half-size of the window searched around the harmonic, in bins.
    pub harmonic_radius: usize,
    /// Fundamental peak must exceed this multiple of the mean window magnitude.
    pub min_peak_ratio: f64,
    /// Harmonic peaks weaker than this fraction of the fundamental are ignored.
    pub min_harmonic_fraction: f64,
    /// A sub-multiple of the peak inside the DC exclusion carrying more than
    /// this fraction of the peak magnitude fails detection.
    pub max_subharmonic_ratio: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            search_window: DEFAULT_SEARCH_WINDOW,
            dc_exclusion: DEFAULT_DC_EXCLUSION,
            harmonic_factor: DEFAULT_HARMONIC_FACTOR,
            harmonic_radius: DEFAULT_HARMONIC_RADIUS,
            min_peak_ratio: DEFAULT_MIN_PEAK_RATIO,
            min_harmonic_fraction: DEFAULT_MIN_HARMONIC_FRACTION,
            max_subharmonic_ratio: DEFAULT_MAX_SUBHARMONIC_RATIO,
        }
    }
}

/// A spectral peak at signed frequency `(ky, kx)`.
#[derive(Clone, Copy, Debug)]
struct Peak {
    ky: i64,
    kx: i64,
    magnitude: f64,
}

/// Detect the periodic line family in a frame.
pub fn detect_lines_in_frame(frame: &Frame, config: &DetectionConfig) -> Result<LineFamily> {
    detect_lines(&frame.data, config)
}

/// Recover spacing, orientation and phase of a periodic line pattern from
/// its 2-D spectrum.
///
/// The lines of the returned family sit on the intensity maxima of the
/// pattern, using the same convention as hand-picked families.
pub fn detect_lines(image: &Array2<f32>, config: &DetectionConfig) -> Result<LineFamily> {
    let (h, w) = image.dim();
    let ky_max = config.search_window.min(h / 2) as i64;
    let kx_max = config.search_window.min(w / 2) as i64;
    let exclusion = config.dc_exclusion as i64;
    if ky_max < 1 || kx_max < 1 || (ky_max <= exclusion && kx_max <= exclusion) {
        return Err(LinescanError::DetectionFailed(format!(
            "{w}x{h} image leaves no search window outside the DC exclusion"
        )));
    }
    if !has_contrast(image) {
        return Err(LinescanError::DetectionFailed(
            "image has no intensity variation".into(),
        ));
    }

    let spectrum = Spectrum::of_mean_subtracted(image);
    let fundamental = find_fundamental(&spectrum, ky_max, kx_max, exclusion, config)?;
    debug!(
        ky = fundamental.ky,
        kx = fundamental.kx,
        magnitude = fundamental.magnitude,
        "Fundamental frequency located"
    );

    reject_hidden_fundamental(&spectrum, fundamental, exclusion, config)?;

    let (ky, kx) = refine_frequency(image, &spectrum, fundamental, config);
    let fy = ky / h as f64;
    let fx = kx / w as f64;
    let frequency = fx.hypot(fy);
    let distance = 1.0 / frequency;
    if !distance.is_finite() || distance <= 0.0 {
        return Err(LinescanError::DetectionFailed(format!(
            "degenerate frequency estimate ({fx}, {fy})"
        )));
    }

    let orientation = fy.atan2(fx) + FRAC_PI_2;

    // Phase relative to the image centre, then carried back to the origin.
    let centre = ((h as f64 - 1.0) / 2.0, (w as f64 - 1.0) / 2.0);
    let phase = dft_at(image, fy, fx, centre).arg();
    let centre_projection = (fx * centre.1 + fy * centre.0) / frequency;
    let offset = symmetric_remainder(phase * distance / TAU - centre_projection, distance);

    let family = LineFamily::new(Line::new(orientation, offset), distance)?;
    info!(
        distance = family.distance(),
        orientation = family.orientation(),
        offset = family.offset(),
        "Line family detected"
    );
    Ok(family)
}

fn has_contrast(image: &Array2<f32>) -> bool {
    let n = image.len() as f64;
    let mean = image.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = image
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance > EPSILON
}

/// Strongest non-DC peak in the half-plane `ky > 0`.
///
/// The `kx = 0` column is skipped along with the `ky = 0` row: both carry the
/// energy of the non-periodic image borders.
fn find_fundamental(
    spectrum: &Spectrum,
    ky_max: i64,
    kx_max: i64,
    exclusion: i64,
    config: &DetectionConfig,
) -> Result<Peak> {
    let mut best: Option<Peak> = None;
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for ky in 1..=ky_max {
        for kx in -kx_max..=kx_max {
            if kx == 0 || (ky <= exclusion && kx.abs() <= exclusion) {
                continue;
            }
            let magnitude = spectrum.magnitude(ky, kx);
            sum += magnitude;
            count += 1;
            if best.map_or(true, |b| magnitude > b.magnitude) {
                best = Some(Peak { ky, kx, magnitude });
            }
        }
    }

    let peak = best.ok_or_else(|| {
        LinescanError::DetectionFailed("empty frequency search window".into())
    })?;
    let mean = sum / count as f64;
    if peak.magnitude <= EPSILON || peak.magnitude < config.min_peak_ratio * mean {
        return Err(LinescanError::DetectionFailed(format!(
            "no dominant frequency (peak {:.3e}, window mean {:.3e})",
            peak.magnitude, mean
        )));
    }
    Ok(peak)
}

/// Sub-bin frequency estimate `(ky, kx)` from the harmonic of `fundamental`,
/// or from the fundamental itself when no usable harmonic exists.
///
/// The integer peak is refined with a parabola fit on the spectrum and then
/// polished against the continuous DFT of `image`.
fn refine_frequency(
    image: &Array2<f32>,
    spectrum: &Spectrum,
    fundamental: Peak,
    config: &DetectionConfig,
) -> (f64, f64) {
    let (h, w) = spectrum.dim();
    let radius = config.harmonic_radius as i64;
    let factor = usable_harmonic_factor(fundamental, config.harmonic_factor, radius, h, w);

    let mut target = (fundamental, 1usize);
    if factor >= 2 {
        let harmonic = find_harmonic(spectrum, fundamental, factor, radius);
        if harmonic.magnitude >= config.min_harmonic_fraction * fundamental.magnitude {
            debug!(
                factor,
                ky = harmonic.ky,
                kx = harmonic.kx,
                magnitude = harmonic.magnitude,
                "Harmonic refinement"
            );
            target = (harmonic, factor);
        } else {
            warn!(
                factor,
                magnitude = harmonic.magnitude,
                "Harmonic too weak, refining fundamental instead"
            );
        }
    } else if config.harmonic_factor >= 2 {
        warn!(
            requested = config.harmonic_factor,
            "Harmonic beyond Nyquist, refining fundamental instead"
        );
    }

    let (peak, factor) = target;
    let (dy, dx) = refine_peak_paraboloid(|dy, dx| spectrum.magnitude(peak.ky + dy, peak.kx + dx));
    let centre = ((h as f64 - 1.0) / 2.0, (w as f64 - 1.0) / 2.0);
    let (ky, kx) = polish_peak(
        |ky, kx| dft_at(image, ky / h as f64, kx / w as f64, centre).norm(),
        (peak.ky as f64 + dy, peak.kx as f64 + dx),
        0.25,
        FREQUENCY_POLISH_ITERATIONS,
    );
    let f = factor as f64;
    (ky / f, kx / f)
}

/// Fail when the peak is a harmonic of a fundamental hidden inside the DC
/// exclusion zone, i.e. when the line spacing exceeds what the search window
/// can resolve.
fn reject_hidden_fundamental(
    spectrum: &Spectrum,
    peak: Peak,
    exclusion: i64,
    config: &DetectionConfig,
) -> Result<()> {
    for n in 2..=SUBHARMONIC_ORDERS as i64 {
        let cy = (peak.ky as f64 / n as f64).round() as i64;
        let cx = (peak.kx as f64 / n as f64).round() as i64;
        if cy.abs() > exclusion || cx.abs() > exclusion {
            continue;
        }
        let strongest = (cy - 1..=cy + 1)
            .flat_map(|ky| (cx - 1..=cx + 1).map(move |kx| (ky, kx)))
            .filter(|&(ky, kx)| ky != 0 && kx != 0)
            .map(|(ky, kx)| spectrum.magnitude(ky, kx))
            .fold(0.0f64, f64::max);
        if strongest > config.max_subharmonic_ratio * peak.magnitude {
            let (h, w) = spectrum.dim();
            let limit = h.min(w) as f64 / exclusion.max(1) as f64;
            return Err(LinescanError::DetectionFailed(format!(
                "strongest peak ({}, {}) is harmonic {n} of a frequency inside the DC \
                 exclusion; line spacing exceeds the detectable limit of {limit:.1} px",
                peak.ky, peak.kx
            )));
        }
    }
    Ok(())
}

/// Largest factor up to `requested` whose search window stays inside the
/// Nyquist band.
fn usable_harmonic_factor(peak: Peak, requested: usize, radius: i64, h: usize, w: usize) -> usize {
    let ky_limit = (h / 2) as i64;
    let kx_limit = (w / 2) as i64;
    (1..=requested.max(1))
        .rev()
        .find(|&f| {
            let f = f as i64;
            f * peak.ky.abs() + radius <= ky_limit && f * peak.kx.abs() + radius <= kx_limit
        })
        .unwrap_or(1)
}

fn find_harmonic(spectrum: &Spectrum, fundamental: Peak, factor: usize, radius: i64) -> Peak {
    let f = factor as i64;
    let (cy, cx) = (fundamental.ky * f, fundamental.kx * f);
    let mut best = Peak {
        ky: cy,
        kx: cx,
        magnitude: spectrum.magnitude(cy, cx),
    };
    for ky in cy - radius..=cy + radius {
        for kx in cx - radius..=cx + radius {
            if ky == 0 || kx == 0 {
                continue;
            }
            let magnitude = spectrum.magnitude(ky, kx);
            if magnitude > best.magnitude {
                best = Peak { ky, kx, magnitude };
            }
        }
    }
    best
}
