use anyhow::Result;
use clap::Args;
use starstack_core::solver::{field_of_view_arcmin, pixel_scale, ScaleRange};

#[derive(Args)]
pub struct ScaleArgs {
    /// Pixel size in micrometres
    #[arg(long)]
    pub pixel_size: f64,

    /// Focal length in millimetres
    #[arg(long)]
    pub focal_length: f64,

    /// Sensor width in millimetres
    #[arg(long)]
    pub sensor_width: Option<f64>,

    /// Sensor height in millimetres
    #[arg(long)]
    pub sensor_height: Option<f64>,
}

pub fn run(args: &ScaleArgs) -> Result<()> {
    anyhow::ensure!(
        args.pixel_size > 0.0 && args.focal_length > 0.0,
        "pixel size and focal length must be positive"
    );

    let scale = pixel_scale(args.pixel_size, args.focal_length);
    let range = ScaleRange::around(scale);
    println!("Pixel scale:   {scale:.3}\"/px");
    println!("Solver range:  {:.3} .. {:.3}\"/px", range.low, range.high);

    if let (Some(w), Some(h)) = (args.sensor_width, args.sensor_height) {
        let fw = field_of_view_arcmin(w, args.pixel_size, scale);
        let fh = field_of_view_arcmin(h, args.pixel_size, scale);
        println!("Field of view: {fw:.1}' x {fh:.1}'");
    } else if let Some(w) = args.sensor_width.or(args.sensor_height) {
        println!(
            "Field of view: {:.1}'",
            field_of_view_arcmin(w, args.pixel_size, scale)
        );
    }
    Ok(())
}
