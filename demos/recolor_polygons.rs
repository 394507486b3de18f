use image::DynamicImage;
use polygon_recolor::{
    ColorPolicy, RecolorConfig, apply_mask_overlay, measure::measure, process_polygons, to_mask,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    // 1. Load base image and mask
    let base_path = "assets/color_mask.png";
    let mask_path = "assets/mask.png";
    let base = image::open(base_path)?.to_rgb8();
    let mask = to_mask(&image::open(mask_path)?);

    // 2. Plain overlay
    let overlaid = apply_mask_overlay(&base, &mask)?;
    overlaid.save("assets/overlay.png")?;
    println!("Saved assets/overlay.png");

    // 3. Recolor each polygon, once per policy
    for (name, policy) in [
        ("palette", ColorPolicy::default()),
        ("mean", ColorPolicy::Mean),
    ] {
        let config = RecolorConfig::default().with_policy(policy);
        let (processed, _report) = measure(&format!("process_polygons ({name})"), || {
            process_polygons(&base, &mask, &config)
        });
        let path = format!("assets/processed_{name}.png");
        DynamicImage::ImageRgb8(processed?).save(&path)?;
        println!("Saved {path}");
    }

    Ok(())
}
