//! Skybox Stitcher CLI
//!
//! Stitch six skybox faces into a CS2 cross atlas.

use clap::{Parser, Subcommand};
use skybox_stitcher::config::default_settings_path;
use skybox_stitcher::external::convert_vtf_directory;
use skybox_stitcher::pipeline::list_addons;
use skybox_stitcher::{
    CancelToken, ConversionRequest, FaceInput, FaceSlot, OutputTarget, OverwritePolicy,
    SettingsSnapshot, SkyboxConverter, StitchError, VtfCmdDecoder,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "skybox-stitcher")]
#[command(
    author,
    version,
    about = "Stitch six skybox faces into a CS2 cross atlas",
    long_about = None
)]
struct Cli {
    /// Settings file (defaults to the shared mapping tools settings)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Path to VTFCmd.exe (overrides settings)
    #[arg(long, global = true)]
    vtfcmd: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the cross atlas (and optional .vmat files)
    Stitch {
        /// Face images; slots are detected from the file names
        faces: Vec<PathBuf>,

        /// Folder or ZIP containing the six faces
        #[arg(short, long, conflicts_with_all = ["faces", "assign"])]
        input: Option<PathBuf>,

        /// Explicit slot assignments as path=slot (e.g., "night1.png=up")
        #[arg(short, long, value_parser = parse_assignment, conflicts_with = "faces")]
        assign: Vec<(PathBuf, FaceSlot)>,

        /// Output PNG path
        #[arg(short, long, conflicts_with = "addon")]
        output: Option<PathBuf>,

        /// Write into materials/skybox of this CS2 addon
        #[arg(long)]
        addon: Option<String>,

        /// Any path inside the CS2 install (overrides settings)
        #[arg(long)]
        cs2_path: Option<PathBuf>,

        /// Atlas file name inside the addon
        #[arg(long, requires = "addon")]
        name: Option<String>,

        /// Also write a sky.vfx material
        #[arg(long)]
        skybox_vmat: bool,

        /// Also write a moondome material
        #[arg(long)]
        moondome_vmat: bool,

        /// Replace existing output files
        #[arg(long)]
        overwrite: bool,
    },

    /// Show which file lands in which slot
    Identify {
        /// Face images, or a single folder/ZIP
        inputs: Vec<PathBuf>,
    },

    /// Convert every VTF in a folder to PNG with VTFCmd
    Vtf2png {
        /// Folder containing .vtf files
        dir: PathBuf,
    },

    /// List addons of the CS2 install
    Addons {
        /// Any path inside the CS2 install (overrides settings)
        #[arg(long)]
        cs2_path: Option<PathBuf>,
    },
}

fn parse_assignment(s: &str) -> Result<(PathBuf, FaceSlot), String> {
    let (path, slot) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("Invalid assignment format: '{}'. Use path=slot", s))?;
    let slot = FaceSlot::from_str(slot).ok_or_else(|| format!("Unknown face slot '{}'", slot))?;
    Ok((PathBuf::from(path), slot))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.hint() {
                eprintln!("{}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), StitchError> {
    let settings_path = cli.settings.unwrap_or_else(default_settings_path);
    let snapshot = SettingsSnapshot::load(&settings_path);
    let mut settings = snapshot.settings().clone();
    if let Some(vtfcmd) = cli.vtfcmd {
        settings.vtfcmd_path = Some(vtfcmd);
    }

    match cli.command {
        Commands::Stitch {
            faces,
            input,
            assign,
            output,
            addon,
            cs2_path,
            name,
            skybox_vmat,
            moondome_vmat,
            overwrite,
        } => {
            let faces = if let Some(input) = input {
                FaceInput::Folder(input)
            } else if !assign.is_empty() {
                FaceInput::Assigned(assign.into_iter().collect::<HashMap<_, _>>())
            } else {
                FaceInput::Files(faces)
            };

            let target = match (output, addon) {
                (Some(path), _) => OutputTarget::File(path),
                (None, Some(addon)) => OutputTarget::Addon {
                    cs2_path: cs2_path
                        .or_else(|| settings.cs2_path.clone())
                        .ok_or_else(missing_cs2_path)?,
                    addon,
                    file_name: name,
                },
                (None, None) => {
                    return Err(StitchError::InvalidInput(
                        "pass --output or --addon".to_string(),
                    ))
                }
            };

            let mut request = ConversionRequest::new(faces, target)
                .with_settings(&settings)
                .with_overwrite(if overwrite {
                    OverwritePolicy::Replace
                } else {
                    OverwritePolicy::Refuse
                });
            request.create_skybox_vmat |= skybox_vmat;
            request.create_moondome_vmat |= moondome_vmat;

            let converter = SkyboxConverter::from_settings(&settings);
            let report = converter.convert(&request, &CancelToken::new())?;

            println!(
                "Wrote {}x{} atlas to {:?}",
                report.width, report.height, report.atlas_path
            );
            for sidecar in &report.sidecars {
                println!("  Material: {:?}", sidecar);
            }
            for warning in &report.warnings {
                println!("  Warning: {}", warning);
            }
        }
        Commands::Identify { inputs } => {
            let single_container =
                inputs.len() == 1 && (inputs[0].is_dir() || is_zip(&inputs[0]));
            let faces = if single_container {
                FaceInput::Folder(inputs[0].clone())
            } else {
                FaceInput::Files(inputs)
            };
            let converter = SkyboxConverter::default();
            let (_, mapping) = converter.identify(&faces)?;
            println!("Atlas cells:");
            for target in FaceSlot::PROCESSING_ORDER {
                let rule = converter.table().rule(target);
                if let Some(path) = mapping.get(&rule.source_slot) {
                    println!(
                        "  {:<5} <- {:?} ({} face, rotate {}, flip {:?})",
                        target.as_str(),
                        path,
                        rule.source_slot,
                        rule.rotation.degrees(),
                        rule.flip
                    );
                }
            }
        }
        Commands::Vtf2png { dir } => {
            let decoder = VtfCmdDecoder::from_config(
                settings.vtfcmd_path.as_deref(),
                settings.decode_timeout(),
            );
            let report = convert_vtf_directory(&dir, &decoder, &CancelToken::new())?;
            println!(
                "Converted {} file(s), {} failed",
                report.converted.len(),
                report.failed.len()
            );
            for (path, reason) in &report.failed {
                println!("  {:?}: {}", path, reason);
            }
        }
        Commands::Addons { cs2_path } => {
            let cs2_path = cs2_path.or(settings.cs2_path).ok_or_else(missing_cs2_path)?;
            let addons = list_addons(&cs2_path)?;
            if addons.is_empty() {
                println!("No addons found");
            }
            for addon in addons {
                println!("{}", addon);
            }
        }
    }

    Ok(())
}

fn missing_cs2_path() -> StitchError {
    StitchError::Config("no CS2 path configured; pass --cs2-path".to_string())
}

fn is_zip(path: &std::path::Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}
