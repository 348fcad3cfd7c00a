use clap::{Parser, ValueEnum};
use position_reduction_lib::{BoundingBox, Position, RouteCharacteristics, StaticBounds};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Track Reducer - Reduce the positions of GPX tracks and routes to what a map view can render
pub struct Settings {
    /// GPX files to reduce
    #[clap(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Reduction applied to every track segment, route and waypoint list
    #[clap(short, long, value_enum, default_value = "pipeline")]
    pub mode: Mode,

    /// Treat tracks and routes as this kind of list in the pipeline (default: by GPX element)
    #[clap(short, long, value_enum)]
    pub characteristics: Option<Characteristics>,

    /// Map zoom level the reduction is done for
    #[clap(short, long, default_value = "12")]
    pub zoom: i32,

    /// Visible map area as "west,south,east,north" in degrees (default: no viewport)
    #[clap(long, value_name = "WEST,SOUTH,EAST,NORTH", value_parser = parse_viewport, allow_hyphen_values = true)]
    pub viewport: Option<BoundingBox>,

    /// Number of positions kept by the every-nth mode
    #[clap(short = 'n', long, default_value = "1000")]
    pub target_count: usize,

    /// Viewport slack of the visible mode, in multiples of the viewport size
    #[clap(short, long, default_value = "1.0")]
    pub threshold: f64,

    /// Keep the first and last position in the visible mode
    #[clap(long)]
    pub include_first_and_last: bool,

    /// Waypoint descriptions are shown, so fewer waypoints fit the map
    #[clap(long)]
    pub show_waypoint_description: bool,

    /// Write the reduced GPX files to this directory
    #[clap(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    /// The fixed viewport the reducer queries
    pub fn bounds_provider(&self) -> StaticBounds {
        StaticBounds {
            zoom: self.zoom,
            bounds: self.viewport,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Zoom-aware reduction: visible area, significance and sampling
    Pipeline,
    /// Uniform sampling down to the target count
    EveryNth,
    /// Positions near the viewport
    Visible,
    /// Douglas-Peucker with the tolerance of the zoom level
    Significant,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Characteristics {
    Route,
    Track,
    Waypoints,
}

impl From<Characteristics> for RouteCharacteristics {
    fn from(characteristics: Characteristics) -> Self {
        match characteristics {
            Characteristics::Route => RouteCharacteristics::Route,
            Characteristics::Track => RouteCharacteristics::Track,
            Characteristics::Waypoints => RouteCharacteristics::Waypoints,
        }
    }
}

fn parse_viewport(value: &str) -> Result<BoundingBox, String> {
    let coordinates = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate in {value:?}: {e}"))?;

    let [west, south, east, north] = coordinates[..] else {
        return Err(format!(
            "expected 4 comma-separated coordinates, got {}",
            coordinates.len()
        ));
    };
    if coordinates.iter().any(|c| !c.is_finite()) {
        return Err(format!("coordinates must be finite: {value:?}"));
    }
    if west > east || south > north {
        return Err(format!(
            "west must not exceed east and south must not exceed north: {value:?}"
        ));
    }

    Ok(BoundingBox::new(
        &Position::new(east, north),
        &Position::new(west, south),
    ))
}
