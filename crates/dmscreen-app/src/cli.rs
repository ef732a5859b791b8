//! Command-line interface for inspecting and editing a saved screen.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dmscreen_core::grid::DEFAULT_VIEWPORT_WIDTH;
use dmscreen_core::storage::{AutoSaveManager, DEFAULT_SCREEN_KEY, FileStorage};
use dmscreen_core::{
    GridExtent, GridPoint, Mode, ScreenStore, Widget, WidgetId, WidgetKind, WidgetPatch,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "dmscreen", version, about = "Build and inspect DM screens")]
pub struct Cli {
    /// Directory holding saved screens. Defaults to the platform data directory.
    #[arg(long, global = true, env = "DMSCREEN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Name of the screen to operate on.
    #[arg(long, global = true, default_value = DEFAULT_SCREEN_KEY)]
    pub screen: String,

    /// Viewport width in pixels used for pixel measurements.
    #[arg(long, global = true, default_value_t = DEFAULT_VIEWPORT_WIDTH)]
    pub viewport_width: f64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the screen configuration and widgets.
    Show,
    /// Print the screen as JSON.
    Export,
    /// Add a widget with default content.
    Add {
        kind: WidgetKind,
        /// Add inside this character widget instead of at the top level.
        #[arg(long)]
        parent: Option<WidgetId>,
    },
    /// Remove a widget.
    Remove {
        id: WidgetId,
        #[arg(long)]
        parent: Option<WidgetId>,
    },
    /// Duplicate a widget.
    Clone { id: WidgetId },
    /// Move a widget to a grid position.
    Move { id: WidgetId, x: u32, y: u32 },
    /// Resize a widget in grid units.
    Resize { id: WidgetId, width: u32, height: u32 },
    /// Raise a widget above all others.
    Front { id: WidgetId },
    /// Set the number of grid columns.
    Grid { size: i64 },
    /// Set the zoom: a factor, or `in`, `out`, `reset`.
    Zoom { zoom: ZoomArg },
    /// Switch between normal and edit mode.
    Mode { mode: Mode },
}

/// Zoom argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomArg {
    In,
    Out,
    Reset,
    Factor(f64),
}

impl FromStr for ZoomArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(ZoomArg::In),
            "out" => Ok(ZoomArg::Out),
            "reset" => Ok(ZoomArg::Reset),
            other => other
                .parse::<f64>()
                .map(ZoomArg::Factor)
                .map_err(|_| format!("Invalid zoom: {}", s)),
        }
    }
}

/// Load the screen, apply the command, save if anything changed, and return
/// the text to print.
pub async fn run(cli: Cli) -> Result<String> {
    let storage = match &cli.data_dir {
        Some(dir) => FileStorage::new(dir.clone()),
        None => FileStorage::default_location(),
    }
    .context("Failed to open screen storage")?;

    let mut autosave = AutoSaveManager::new(Arc::new(storage));
    autosave.set_screen_key(cli.screen.clone());
    let screen = autosave
        .load_or_default()
        .await
        .with_context(|| format!("Failed to load screen '{}'", cli.screen))?;

    let mut store = ScreenStore::from_screen(screen);
    store.set_viewport_width(cli.viewport_width);

    let output = execute(&mut store, cli.command)?;

    autosave.observe(store.revision());
    if autosave.is_dirty() {
        autosave
            .save(&store)
            .await
            .with_context(|| format!("Failed to save screen '{}'", cli.screen))?;
    }
    Ok(output)
}

/// Apply one command to the store.
pub fn execute(store: &mut ScreenStore, command: Command) -> Result<String> {
    let output = match command {
        Command::Show => describe(store),
        Command::Export => store.screen().to_json()?,
        Command::Add { kind, parent } => {
            let id = match parent {
                Some(parent) => store.add_nested(parent, kind)?,
                None => store.add_default_widget(kind),
            };
            id.to_string()
        }
        Command::Remove { id, parent } => {
            let removed = match parent {
                Some(parent) => store.delete_nested(parent, id)?,
                None => store.delete_widget(id)?,
            };
            format!("Removed {} widget {}", removed.kind(), removed.id)
        }
        Command::Clone { id } => store.clone_widget(id)?.to_string(),
        Command::Move { id, x, y } => {
            require_edit(store)?;
            store.update_widget(id, WidgetPatch::new().position(GridPoint::new(x, y)))?;
            format!("Moved {} to ({}, {})", id, x, y)
        }
        Command::Resize { id, width, height } => {
            require_edit(store)?;
            store.update_widget(id, WidgetPatch::new().size(GridExtent::new(width, height)))?;
            let size = store.widget(id).map(|w| w.size).unwrap_or_default();
            format!("Resized {} to {}x{}", id, size.width, size.height)
        }
        Command::Front { id } => format!("z-index {}", store.bring_to_front(id)?),
        Command::Grid { size } => format!("Grid size {}", store.set_grid_size(size)),
        Command::Zoom { zoom } => {
            let zoom = match zoom {
                ZoomArg::In => store.zoom_in(),
                ZoomArg::Out => store.zoom_out(),
                ZoomArg::Reset => store.reset_zoom(),
                ZoomArg::Factor(factor) => store.set_zoom(factor),
            };
            format!("Zoom {:.0}%", zoom * 100.0)
        }
        Command::Mode { mode } => {
            store.set_mode(mode);
            format!("Mode {}", mode)
        }
    };
    Ok(output)
}

fn require_edit(store: &ScreenStore) -> Result<()> {
    if !store.mode().is_edit() {
        bail!("Layout can only be changed in edit mode");
    }
    Ok(())
}

fn describe(store: &ScreenStore) -> String {
    let screen = store.screen();
    let canvas = store.canvas_size();
    let pixels = store.canvas_pixel_size();
    let mut out = String::new();

    let _ = writeln!(out, "Grid size: {}", screen.grid_size);
    let _ = writeln!(out, "Zoom: {:.0}%", screen.zoom * 100.0);
    let _ = writeln!(out, "Mode: {}", screen.mode);
    let _ = writeln!(out, "Viewport: ({}, {})", screen.viewport.x, screen.viewport.y);
    let _ = writeln!(
        out,
        "Canvas: {}x{} units ({:.0}x{:.0} px)",
        canvas.width, canvas.height, pixels.width, pixels.height
    );
    let _ = writeln!(out, "Widgets: {}", screen.widgets.len());
    for widget in store.widgets_by_z() {
        write_widget(&mut out, widget, "  ");
        for nested in widget.nested() {
            write_widget(&mut out, nested, "    ");
        }
    }
    out.trim_end().to_string()
}

fn write_widget(out: &mut String, widget: &Widget, indent: &str) {
    let _ = writeln!(
        out,
        "{}{} {:<9} at ({}, {}) size {}x{} z {}",
        indent,
        widget.id,
        widget.kind(),
        widget.position.x,
        widget.position.y,
        widget.size.width,
        widget.size.height,
        widget.z_index
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["dmscreen"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        let cli = parse(&["add", "countdown"]);
        assert!(matches!(
            cli.command,
            Command::Add {
                kind: WidgetKind::Countdown,
                parent: None
            }
        ));
        assert_eq!(cli.screen, DEFAULT_SCREEN_KEY);

        let cli = parse(&["zoom", "in", "--screen", "session"]);
        assert!(matches!(cli.command, Command::Zoom { zoom: ZoomArg::In }));
        assert_eq!(cli.screen, "session");

        assert!(Cli::try_parse_from(["dmscreen", "add", "dragon"]).is_err());
        assert!(Cli::try_parse_from(["dmscreen", "mode", "view"]).is_err());
    }

    #[test]
    fn test_zoom_arg() {
        assert_eq!("1.5".parse::<ZoomArg>().unwrap(), ZoomArg::Factor(1.5));
        assert_eq!("Reset".parse::<ZoomArg>().unwrap(), ZoomArg::Reset);
        assert!("big".parse::<ZoomArg>().is_err());
    }

    #[test]
    fn test_execute_clamps_and_reports() {
        let mut store = ScreenStore::new();
        let out = execute(&mut store, Command::Grid { size: 500 }).unwrap();
        assert_eq!(out, "Grid size 100");
        let out = execute(&mut store, Command::Zoom { zoom: ZoomArg::Factor(0.1) }).unwrap();
        assert_eq!(out, "Zoom 50%");
    }

    #[test]
    fn test_move_requires_edit_mode() {
        let mut store = ScreenStore::new();
        let id = store.add_default_widget(WidgetKind::Text);
        store.set_mode(Mode::Normal);
        assert!(execute(&mut store, Command::Move { id, x: 1, y: 1 }).is_err());
    }

    #[test]
    fn test_run_persists_changes() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();

        let id = pollster::block_on(run(parse(&["--data-dir", data_dir, "add", "fraction"])))
            .unwrap();
        let shown = pollster::block_on(run(parse(&["--data-dir", data_dir, "show"]))).unwrap();
        assert!(shown.contains(&id));
        assert!(shown.contains("fraction"));
        assert!(shown.contains("Widgets: 1"));

        let args = ["--data-dir", data_dir, "clone", id.as_str()];
        let clone = pollster::block_on(run(parse(&args))).unwrap();
        let exported =
            pollster::block_on(run(parse(&["--data-dir", data_dir, "export"]))).unwrap();
        assert!(exported.contains(&clone));
        assert!(dir.path().join(format!("{}.json", DEFAULT_SCREEN_KEY)).exists());
    }

    #[test]
    fn test_run_missing_widget_fails() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();
        let missing = WidgetId::new_v4().to_string();
        let args = ["--data-dir", data_dir, "remove", missing.as_str()];
        let result = pollster::block_on(run(parse(&args)));
        assert!(result.is_err());
    }
}
