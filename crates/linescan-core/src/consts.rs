/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum frame count to use frame-level Rayon parallelism.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;

/// Intensity (after black-level subtraction) above which a pixel counts as
/// illuminated foreground during calibration.
pub const DEFAULT_NOISE_FLOOR: f32 = 5.0;

/// Side length of the centred window used for per-frame means.
pub const DEFAULT_MEAN_ROI_SIZE: usize = 400;

/// Number of sub-lines inside the interval spanned by hand-picked points.
pub const DEFAULT_LINES_PER_INTERVAL: u32 = 10;

/// Harmonic multiple searched for sub-bin frequency refinement.
pub const DEFAULT_HARMONIC_FACTOR: usize = 5;

/// Half-size (in frequency bins) of the window searched around the harmonic.
pub const DEFAULT_HARMONIC_RADIUS: usize = 10;

/// Extent (in frequency bins) of the low-frequency search window.
pub const DEFAULT_SEARCH_WINDOW: usize = 200;

/// Frequency bins around DC excluded from the fundamental search.
pub const DEFAULT_DC_EXCLUSION: usize = 15;

/// Fundamental peak must exceed this multiple of the mean window magnitude.
pub const DEFAULT_MIN_PEAK_RATIO: f64 = 4.0;

/// Harmonic peaks weaker than this fraction of the fundamental are ignored.
pub const DEFAULT_MIN_HARMONIC_FRACTION: f64 = 0.005;

/// Sub-multiples of the spectral peak inside the DC exclusion carrying more
/// than this fraction of its magnitude mark the spacing as too large.
pub const DEFAULT_MAX_SUBHARMONIC_RATIO: f64 = 0.25;

/// Highest sub-multiple order checked for a hidden fundamental.
pub const SUBHARMONIC_ORDERS: usize = 4;

/// Parabola iterations used to polish the peak frequency against the DFT.
pub const FREQUENCY_POLISH_ITERATIONS: usize = 6;

/// Gaussian width (pixels) of the on-line mask.
pub const DEFAULT_ON_MASK_WIDTH: f32 = 2.0;

/// Weight applied to the off-line mask.
pub const DEFAULT_OFF_MASK_SCALE: f32 = 0.5;

/// Default background subtraction strength.
pub const DEFAULT_SUBTRACTION_ALPHA: f32 = 1.0;

/// Half-width (pixels) of lines drawn by the overlay preview.
pub const DEFAULT_OVERLAY_HALF_WIDTH: f64 = 1.0;
