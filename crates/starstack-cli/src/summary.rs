use console::Style;
use starstack_core::pipeline::config::{BatchConfig, SolverMethod};
use starstack_core::pipeline::BatchReport;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    good: Style,
    bad: Style,
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
            good: Style::new().green().bold(),
            bad: Style::new().red().bold(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn rule(len: usize) -> String {
    "\u{2550}".repeat(len)
}

pub fn print_batch_summary(config: &BatchConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Starstack Batch"));
    println!("  {}", s.title.apply_to(rule(15)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(config.inputs.len())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Snapshots"),
        s.path.apply_to(config.workdir.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Stars"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Solver"),
        s.method.apply_to(&config.solver.method)
    );
    if let SolverMethod::Detect(d) = &config.solver.method {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Area"),
            s.value.apply_to(format!("{}..{} px", d.min_area, d.max_area))
        );
    }
    match config.solver.scale_arcsec {
        Some(scale) => println!(
            "    {:<12}{}",
            s.label.apply_to("Scale"),
            s.value.apply_to(format!("{scale:.3}\"/px"))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Scale"),
            s.disabled.apply_to("unchecked")
        ),
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Max stars"),
        s.value.apply_to(config.matching.max_stars)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Epsilon"),
        s.value.apply_to(format!("{:e}", config.matching.epsilon))
    );
    println!();

    println!("  {}", s.header.apply_to("Flat Field"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Grid"),
        s.value.apply_to(format!(
            "every {} px, margin {} px",
            config.flat.grid_step, config.flat.margin
        ))
    );
    println!();

    println!("  {}", s.header.apply_to("Stacking"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Tolerance"),
        s.value.apply_to(format!("{:.2} sigma", config.stacking.tolerance))
    );
    println!();
}

pub fn print_batch_report(report: &BatchReport) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Succeeded"),
        s.good.apply_to(report.succeeded)
    );
    let failed = if report.failed > 0 { &s.bad } else { &s.value };
    println!(
        "    {:<12}{}",
        s.label.apply_to("Failed"),
        failed.apply_to(report.failed)
    );

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(frame) if frame.alignment.reference => println!(
                "    {:>4}  {}  {}",
                outcome.index,
                outcome.source.display(),
                s.method.apply_to("reference")
            ),
            Ok(frame) => println!(
                "    {:>4}  {}  {:+.2} deg  ({:+.1}, {:+.1}) px",
                outcome.index,
                outcome.source.display(),
                frame.alignment.angle.to_degrees(),
                frame.alignment.translation.0,
                frame.alignment.translation.1
            ),
            Err(e) => println!(
                "    {:>4}  {}  {}",
                outcome.index,
                outcome.source.display(),
                s.bad.apply_to(e)
            ),
        }
    }
    println!();

    if report.cancelled {
        println!("  {}", s.disabled.apply_to("Cancelled before stacking"));
    } else if let Some(ref error) = report.stack_error {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Not stacked"),
            s.bad.apply_to(error)
        );
    } else if let Some(ref output) = report.output {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Saved"),
            s.path.apply_to(output.display())
        );
    }
    println!();
}
