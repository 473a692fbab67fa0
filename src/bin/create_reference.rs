use doc_reference::config::{self, CliAction, CliConfig};
use doc_reference::frames::{Frame, ImageSequence};
use doc_reference::image::io::load_rgb_image;
use doc_reference::logging;
use doc_reference::overlay;
use doc_reference::reference::{save_reference, OutputPaths, Selection};
use doc_reference::tracker::{PlanarTracker, Tracker, TrackerParams};
use doc_reference::types::TrackOutput;
use doc_reference::viewer::{UserAction, Viewer};
use image::RgbImage;
use log::{debug, error, info};
use std::env;

const PROGRAM: &str = "create_reference";
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

/// Frame currently on screen with its decision and visualization.
struct Shown {
    frame: Frame,
    output: TrackOutput,
    visualization: RgbImage,
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| PROGRAM.to_string());
    let cli = match config::parse_args(args) {
        Ok(CliAction::Run(cli)) => cli,
        Ok(CliAction::Help) => {
            println!("{}", config::usage(&program));
            return Ok(());
        }
        Ok(CliAction::Version) => {
            println!("{PROGRAM} {VERSION}");
            return Ok(());
        }
        Err(err) => return Err(format!("{err}\n{}", config::usage(&program))),
    };
    config::validate_paths(&cli)?;

    let paths = OutputPaths::new(&cli.output_dir);
    logging::init(cli.debug, Some(&paths.log()))?;
    logging::program_header(PROGRAM, VERSION);
    logging::dump_args(cli.entries());

    let params = match &cli.params_path {
        Some(path) => config::load_tracker_params(path)?,
        None => TrackerParams::default(),
    };
    debug!("Creating tracker...");
    let mut tracker = PlanarTracker::sift_bf_with(params);
    debug!("Tracker {} created.", tracker.name());

    debug!("Configuring tracker with model '{}'", cli.ground_truth.display());
    tracker
        .reconfigure_model(&cli.ground_truth)
        .map_err(|e| e.to_string())?;
    debug!("Tracker model configuration complete.");
    let reference = load_rgb_image(&cli.ground_truth)?;

    let frames = ImageSequence::open(&cli.frames_dir)?;
    if frames.is_empty() {
        return Err(format!("No frames found in {}", cli.frames_dir.display()));
    }
    debug!("{} frames in {}", frames.len(), cli.frames_dir.display());

    let shown = select_frame(&mut tracker, &reference, frames)?;
    save(&cli, &paths, &reference, shown)
}

fn select_frame(
    tracker: &mut impl Tracker,
    reference: &RgbImage,
    frames: ImageSequence,
) -> Result<Shown, String> {
    debug!("--- Process started. ---");
    let mut viewer: Option<Viewer> = None;
    let mut frame_size: Option<(u32, u32)> = None;
    let mut shown: Option<Shown> = None;
    let mut next_index = 0;

    for item in frames {
        let frame = match item {
            Ok(frame) => frame,
            Err(err) => {
                error!("Read error at frame {next_index:02}: {err}");
                break;
            }
        };
        next_index = frame.index + 1;

        let dims = frame.image.dimensions();
        if frame_size != Some(dims) {
            frame_size = Some(dims);
            debug!("Reinitializing tracker with frame size (w={}; h={})", dims.0, dims.1);
            tracker.reinit_frame_size(dims.0, dims.1);
        }

        let output = tracker.process_frame(&frame.image);
        match (&output.quad, output.rejected) {
            (Some(q), false) => info!(
                "frame {:04}: A tl:({:4.0},{:4.0}) bl:({:4.0},{:4.0}) br:({:4.0},{:4.0}) tr:({:4.0},{:4.0})",
                frame.index,
                q.top_left[0],
                q.top_left[1],
                q.bottom_left[0],
                q.bottom_left[1],
                q.bottom_right[0],
                q.bottom_right[1],
                q.top_right[0],
                q.top_right[1]
            ),
            _ => info!("frame {:04}: R", frame.index),
        }

        let visualization = overlay::render(&frame.image, &output);
        let view = match viewer.take() {
            Some(v) => v,
            None => Viewer::open(reference, &visualization)?,
        };
        let view = viewer.insert(view);
        view.show(&visualization);
        shown = Some(Shown {
            frame,
            output,
            visualization,
        });

        info!("Press <q> to save and quit or <SPACE> to select next frame.");
        if view.wait_for_action()? == UserAction::Quit {
            return shown.ok_or_else(|| "No frame selected".to_string());
        }
    }

    error!("End of stream (or read error) reached at frame {next_index:02}.");
    shown.ok_or_else(|| "No frame could be read".to_string())
}

fn save(cli: &CliConfig, paths: &OutputPaths, reference: &RgbImage, shown: Shown) -> Result<(), String> {
    let quad = shown.output.quad.ok_or_else(|| {
        format!(
            "The document was never found up to frame {:02}; nothing to save",
            shown.frame.index
        )
    })?;
    if shown.output.rejected {
        info!(
            "Frame {:02} was rejected; saving the last known corners",
            shown.frame.index
        );
    }
    let selection = Selection {
        frame_id: shown.frame.index,
        frame: &shown.frame.image,
        visualization: &shown.visualization,
        quad,
    };
    let record = save_reference(paths, reference.dimensions(), &selection)?;
    info!(
        "Saved frame {:02} ({}) to {}",
        record.reference_frame_id,
        shown.frame.path.display(),
        cli.output_dir.display()
    );
    debug!("--- Process complete. ---");
    Ok(())
}
