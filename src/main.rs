//! Binary entry point: wire configuration, planner, motion client, camera
//! backend and sequencer together, then dispatch on the selected mode.

use anyhow::Result;
use clap::Parser;
use log::info;
use microscan::camera::{Camera, CommandCamera, CropWindow};
use microscan::cli::Cli;
use microscan::config::Settings;
use microscan::motion::GrblClient;
use microscan::output::{ImageFormat, OutputLayout};
use microscan::overlay::render_overlay;
use microscan::planner::Plan;
use microscan::sequencer::CaptureSequencer;
use std::io::BufRead;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(host) = &cli.host {
        settings.controller.host = host.clone();
    }

    let objective = settings.objective(&cli.obj)?;
    let overlap = f64::from(cli.overlap) / 100.0;
    let res = settings.camera.resolution();
    let plan = Plan::new(objective, overlap, res)?;
    info!("Step X: {} mm, Step Y: {} mm", plan.step_x(), plan.step_y());

    let grid = plan.grid(cli.end)?;
    info!(
        "Taking {}x{} pictures ({} tiles) of {}/{} layer {}",
        grid.x_count(),
        grid.y_count(),
        grid.len(),
        cli.vendor,
        cli.chip,
        cli.layer
    );

    let mut camera = CommandCamera::new(&settings.camera);

    if cli.view {
        let preview_res = res.scaled(settings.camera.preview_scale);
        let guide = render_overlay(plan.objective(), plan.overlap(), preview_res);
        let crop = cli
            .crop
            .then(|| CropWindow::from_margins(&plan.objective().margins));
        camera.start_preview(&guide, crop)?;
        park();
    }

    if cli.format == ImageFormat::Crop {
        info!("Crop window at sensor resolution: {:?}", plan.crop_px());
        camera.set_capture_crop(Some(CropWindow::from_margins(&plan.objective().margins)));
    }

    let motion = GrblClient::connect(
        &settings.controller.host,
        settings.controller.port,
        settings.controller.ack_timeout,
    )?;
    let mut sequencer = CaptureSequencer::new(
        motion,
        camera,
        settings.camera.controls.clone(),
        settings.timing.clone(),
        cli.dry,
    );

    if cli.test {
        sequencer.run_test(&grid)?;
        park();
    }

    if cli.level {
        let stdin = std::io::stdin();
        let mut line = String::new();
        let mut confirm = move || {
            line.clear();
            // EOF ends the leveling loop; any entered line continues it.
            matches!(stdin.lock().read_line(&mut line), Ok(n) if n > 0)
        };
        sequencer.run_level(&grid, &mut confirm)?;
        return Ok(());
    }

    let output = if cli.dry {
        OutputLayout::locate(&cli.out, &cli.vendor, &cli.chip, cli.extraid.as_deref())
    } else {
        let output =
            OutputLayout::create(&cli.out, &cli.vendor, &cli.chip, cli.extraid.as_deref())?;
        info!("Writing tiles to {}", output.dir().display());
        output
    };

    sequencer.run(&grid, &output, cli.format)?;
    info!("Scan complete");
    Ok(())
}

/// Park the process for operator-interactive modes; the only way out is
/// external termination.
fn park() -> ! {
    loop {
        thread::sleep(Duration::from_secs(1));
    }
}
