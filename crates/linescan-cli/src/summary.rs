use std::path::Path;

use console::Style;
use linescan_core::geometry::LineFamily;
use linescan_core::pipeline::{CalibrationOutput, PipelineConfig, SubtractionOutput};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(title.chars().count())));
    println!();
}

pub fn print_pipeline_summary(title: &str, input: &Path, output: &Path, config: &PipelineConfig) {
    let s = Styles::new();
    print_title(&s, title);

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Black level"),
        s.value.apply_to(config.black_level)
    );
    match config.steps_per_direction {
        Some(steps) => println!(
            "  {:<14}{}",
            s.label.apply_to("Steps"),
            s.value.apply_to(steps)
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Steps"),
            s.disabled.apply_to("whole stack")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Directions"));
    for (i, source) in config.directions.iter().enumerate() {
        println!(
            "    {}. {} {}",
            s.label.apply_to(i + 1),
            s.method.apply_to(source),
            s.label.apply_to(format!("({})", source.direction()))
        );
    }
    println!();
}

pub fn print_family(family: &LineFamily) {
    let s = Styles::new();
    println!("  {}", s.header.apply_to("Line family"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Spacing"),
        s.value.apply_to(format!("{:.4} px", family.distance()))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Orientation"),
        s.value.apply_to(format!(
            "{:.6} rad ({:.2}\u{00b0})",
            family.orientation(),
            family.orientation().to_degrees()
        ))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Offset"),
        s.value.apply_to(format!("{:.4} px", family.offset()))
    );
    println!();
}

pub fn print_calibration_summary(output: &CalibrationOutput) {
    let s = Styles::new();
    for (i, (family, calibration)) in output
        .families
        .iter()
        .zip(&output.calibrations)
        .enumerate()
    {
        println!("  {}", s.header.apply_to(format!("Direction {}", i + 1)));
        println!(
            "    {:<14}{}",
            s.label.apply_to("Spacing"),
            s.value.apply_to(format!("{:.4} px", family.distance()))
        );
        println!(
            "    {:<14}{}",
            s.label.apply_to("Frames"),
            s.value.apply_to(calibration.factors.len())
        );
        println!(
            "    {:<14}{}",
            s.label.apply_to("Lines"),
            s.value.apply_to(calibration.line_means.len())
        );
        let (min, max) = calibration
            .line_means
            .values()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &m| {
                (lo.min(m), hi.max(m))
            });
        if min.is_finite() {
            println!(
                "    {:<14}{}",
                s.label.apply_to("Line means"),
                s.value.apply_to(format!("{min:.3} .. {max:.3}"))
            );
        }
        println!();
    }
}

pub fn print_subtraction_summary(config: &PipelineConfig, output: &SubtractionOutput) {
    let s = Styles::new();
    println!("  {}", s.header.apply_to("Subtraction"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Mode"),
        s.method.apply_to(config.subtraction.mode)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Alpha"),
        s.value.apply_to(config.subtraction.alpha)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("On width"),
        s.value.apply_to(format!("{} px", config.masks.on_width))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Off width"),
        s.value.apply_to(format!("{} px", config.masks.off_width()))
    );
    for (i, direction) in output.directions.iter().enumerate() {
        let (min, max) = direction
            .normalization
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &n| {
                (lo.min(n), hi.max(n))
            });
        println!(
            "    {:<14}{}",
            s.label.apply_to(format!("Norm dir {}", i + 1)),
            s.value.apply_to(format!("{min:.3} .. {max:.3}"))
        );
    }
    println!();
}
