use std::fs;
use std::path::{Path, PathBuf};

/// Validated driver arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct CliConfig {
    pub debug: bool,
    pub params_path: Option<PathBuf>,
    pub ground_truth: PathBuf,
    pub frames_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl CliConfig {
    /// `(name, value)` pairs for the startup argument dump.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("debug", self.debug.to_string()),
            (
                "params",
                self.params_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            ("ground_truth_image", self.ground_truth.display().to_string()),
            ("frames_dir", self.frames_dir.display().to_string()),
            ("output_dir", self.output_dir.display().to_string()),
        ]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CliAction {
    Run(CliConfig),
    Help,
    Version,
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [-d|--debug] [--params <tracker.json>] <ground_truth_image> <frames_dir> <output_dir>\n\
         \n\
         Locate the reference document in each frame and save the frame you pick.\n\
         \n\
         Arguments:\n\
         \x20 ground_truth_image  image of the document used as the tracking model\n\
         \x20 frames_dir          directory of frames (png, jpg, bmp, tif), sorted by name\n\
         \x20 output_dir          created if missing; receives sample.json and images\n\
         \n\
         Options:\n\
         \x20 -d, --debug         debug-level logging\n\
         \x20     --params FILE   JSON tracker parameters\n\
         \x20 -h, --help          print this help\n\
         \x20 -V, --version       print the version\n\
         \n\
         Keys: <space> next frame, <q> save and quit."
    )
}

/// Parse arguments (without the program name). Paths are not checked here;
/// see [`validate_paths`].
pub fn parse_args<I>(args: I) -> Result<CliAction, String>
where
    I: IntoIterator<Item = String>,
{
    let mut debug = false;
    let mut params_path = None;
    let mut positional = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-V" | "--version" => return Ok(CliAction::Version),
            "-d" | "--debug" => debug = true,
            "--params" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--params requires a file path".to_string())?;
                params_path = Some(PathBuf::from(value));
            }
            s if s.starts_with('-') && s.len() > 1 => {
                return Err(format!("Unknown option '{s}'"));
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    let [ground_truth, frames_dir, output_dir]: [PathBuf; 3] = positional
        .try_into()
        .map_err(|p: Vec<PathBuf>| format!("Expected 3 positional arguments, got {}", p.len()))?;
    Ok(CliAction::Run(CliConfig {
        debug,
        params_path,
        ground_truth,
        frames_dir,
        output_dir,
    }))
}

/// Check inputs exist and make sure the output directory exists and is writable.
pub fn validate_paths(config: &CliConfig) -> Result<(), String> {
    if !config.ground_truth.is_file() {
        return Err(format!(
            "'{}' does not exist or is not a file.",
            config.ground_truth.display()
        ));
    }
    if !config.frames_dir.is_dir() {
        return Err(format!(
            "'{}' does not exist or is not a directory.",
            config.frames_dir.display()
        ));
    }
    if let Some(params) = &config.params_path {
        if !params.is_file() {
            return Err(format!("'{}' does not exist or is not a file.", params.display()));
        }
    }
    ensure_output_dir(&config.output_dir)
}

fn ensure_output_dir(dir: &Path) -> Result<(), String> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(format!("'{}' is not a directory.", dir.display()));
        }
        let meta = fs::metadata(dir)
            .map_err(|e| format!("Failed to inspect {}: {e}", dir.display()))?;
        if meta.permissions().readonly() {
            return Err(format!("'{}' is not writable.", dir.display()));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| format!("'{}' cannot be created: {e}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_positionals() {
        let action = parse_args(args(&["-d", "gt.png", "--params", "p.json", "frames", "out"])).unwrap();
        let CliAction::Run(cfg) = action else {
            panic!("expected run action");
        };
        assert!(cfg.debug);
        assert_eq!(cfg.params_path, Some(PathBuf::from("p.json")));
        assert_eq!(cfg.ground_truth, PathBuf::from("gt.png"));
        assert_eq!(cfg.frames_dir, PathBuf::from("frames"));
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse_args(args(&["gt.png", "-h"])).unwrap(), CliAction::Help);
        assert_eq!(parse_args(args(&["--version"])).unwrap(), CliAction::Version);
    }

    #[test]
    fn wrong_arity_and_unknown_flags_fail() {
        assert!(parse_args(args(&["gt.png", "frames"])).is_err());
        assert!(parse_args(args(&["--params"])).is_err());
        assert!(parse_args(args(&["-x", "a", "b", "c"])).is_err());
    }

    #[test]
    fn validation_creates_output_dir() {
        let root = std::env::temp_dir().join(format!("cli_validate_{}", std::process::id()));
        let frames = root.join("frames");
        fs::create_dir_all(&frames).unwrap();
        let gt = root.join("gt.png");
        fs::write(&gt, b"not really a png").unwrap();
        let cfg = CliConfig {
            debug: false,
            params_path: None,
            ground_truth: gt,
            frames_dir: frames,
            output_dir: root.join("out/nested"),
        };
        validate_paths(&cfg).unwrap();
        assert!(cfg.output_dir.is_dir());

        let missing = CliConfig {
            ground_truth: root.join("missing.png"),
            ..cfg
        };
        assert!(validate_paths(&missing).is_err());
        let _ = fs::remove_dir_all(&root);
    }
}
