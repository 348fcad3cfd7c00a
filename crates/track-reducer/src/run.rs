//! Loading, reducing and writing GPX files

use crate::settings::{Mode, Settings};
use gpx::{Gpx, GpxVersion, Waypoint};
use position_reduction_lib::{PositionReducer, ReductionError, RouteCharacteristics, StaticBounds};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GPX error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("Reduction error: {0}")]
    Reduction(#[from] ReductionError),

    #[error("No file name in {}", .0.display())]
    NoFileName(PathBuf),
}

type Result<T> = std::result::Result<T, CliError>;

/// Position counts of one reduced file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReductionSummary {
    pub lists: usize,
    pub positions_before: usize,
    pub positions_after: usize,
}

impl ReductionSummary {
    fn add(&mut self, before: usize, after: usize) {
        self.lists += 1;
        self.positions_before += before;
        self.positions_after += after;
    }
}

impl fmt::Display for ReductionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lists, {} -> {} positions",
            self.lists, self.positions_before, self.positions_after
        )
    }
}

/// Reduce every file given on the command line, in parallel
///
/// Failing files are reported and skipped; the exit code tells whether any failed.
pub fn run(settings: &Settings) -> ExitCode {
    let results: Vec<(&PathBuf, Result<ReductionSummary>)> = settings
        .files
        .par_iter()
        .map(|path| (path, process_file(path, settings)))
        .collect();

    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok(summary) => println!("{}: {}", path.display(), summary),
            Err(e) => {
                tracing::error!("Failed to reduce {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::warn!("{} of {} files failed", failed, settings.files.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn process_file(path: &Path, settings: &Settings) -> Result<ReductionSummary> {
    let file = std::fs::File::open(path)?;
    let mut gpx = gpx::read(std::io::BufReader::new(file))?;

    let summary = reduce_gpx(&mut gpx, settings)?;
    tracing::info!("Reduced {}: {}", path.display(), summary);

    if let Some(output_dir) = &settings.output_dir {
        let output_path = output_path(output_dir, path)?;
        write_gpx(&mut gpx, &output_path)?;
        tracing::info!("Wrote {}", output_path.display());
    }
    Ok(summary)
}

/// Reduce all track segments, routes and waypoints of a GPX document in place
pub fn reduce_gpx(gpx: &mut Gpx, settings: &Settings) -> Result<ReductionSummary> {
    let mut reducer = PositionReducer::new(settings.bounds_provider());
    let mut summary = ReductionSummary::default();

    let track_characteristics = settings
        .characteristics
        .map_or(RouteCharacteristics::Track, Into::into);
    for segment in gpx.tracks.iter_mut().flat_map(|t| t.segments.iter_mut()) {
        let reduced = reduce_list(&mut reducer, &segment.points, track_characteristics, settings)?;
        summary.add(segment.points.len(), reduced.len());
        segment.points = reduced;
    }

    let route_characteristics = settings
        .characteristics
        .map_or(RouteCharacteristics::Route, Into::into);
    for route in &mut gpx.routes {
        let reduced = reduce_list(&mut reducer, &route.points, route_characteristics, settings)?;
        summary.add(route.points.len(), reduced.len());
        route.points = reduced;
    }

    if !gpx.waypoints.is_empty() {
        let reduced = reduce_list(
            &mut reducer,
            &gpx.waypoints,
            RouteCharacteristics::Waypoints,
            settings,
        )?;
        summary.add(gpx.waypoints.len(), reduced.len());
        gpx.waypoints = reduced;
    }

    Ok(summary)
}

fn reduce_list(
    reducer: &mut PositionReducer<StaticBounds, Waypoint>,
    points: &[Waypoint],
    characteristics: RouteCharacteristics,
    settings: &Settings,
) -> Result<Vec<Waypoint>> {
    // Cached reductions belong to the previous list
    reducer.clear();

    let reduced = match settings.mode {
        Mode::Pipeline => reducer.reduce_positions(
            points,
            characteristics,
            settings.show_waypoint_description,
        )?,
        Mode::EveryNth => reducer.filter_every_nth_position(points, settings.target_count)?,
        Mode::Visible => reducer.filter_visible_positions(
            points,
            settings.threshold,
            settings.include_first_and_last,
        )?,
        Mode::Significant if characteristics == RouteCharacteristics::Waypoints => points.to_vec(),
        Mode::Significant => reducer.filter_significant_positions(points, settings.zoom),
    };
    Ok(reduced)
}

fn output_path(output_dir: &Path, input: &Path) -> Result<PathBuf> {
    let file_name = input
        .file_name()
        .ok_or_else(|| CliError::NoFileName(input.to_path_buf()))?;
    Ok(output_dir.join(file_name))
}

fn write_gpx(gpx: &mut Gpx, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // The writer only emits GPX 1.1
    gpx.version = GpxVersion::Gpx11;
    let file = std::fs::File::create(path)?;
    gpx::write(gpx, std::io::BufWriter::new(file))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use geo::Point;
    use gpx::{Track, TrackSegment};

    fn settings(args: &[&str]) -> Settings {
        let mut all = vec!["track-reducer"];
        all.extend_from_slice(args);
        all.push("in.gpx");
        Settings::try_parse_from(all).unwrap()
    }

    /// A straight track along the equator plus a few waypoints
    fn sample_gpx(track_points: usize, waypoints: usize) -> Gpx {
        let mut segment = TrackSegment::default();
        segment.points = (0..track_points)
            .map(|i| Waypoint::new(Point::new(i as f64 * 0.001, 0.0)))
            .collect();

        let mut track = Track::default();
        track.segments.push(segment);

        let mut gpx = Gpx::default();
        gpx.tracks.push(track);
        gpx.waypoints = (0..waypoints)
            .map(|i| Waypoint::new(Point::new(i as f64 * 0.01, 0.01)))
            .collect();
        gpx
    }

    #[test]
    fn test_every_nth_mode() {
        let mut gpx = sample_gpx(1000, 5);
        let summary = reduce_gpx(&mut gpx, &settings(&["--mode", "every-nth", "-n", "10"])).unwrap();

        assert_eq!(
            summary,
            ReductionSummary {
                lists: 2,
                positions_before: 1005,
                positions_after: 15,
            }
        );
        assert_eq!(gpx.tracks[0].segments[0].points.len(), 10);
        assert_eq!(gpx.waypoints.len(), 5);
    }

    #[test]
    fn test_pipeline_mode_simplifies_straight_track() {
        let mut gpx = sample_gpx(1000, 0);
        let summary = reduce_gpx(&mut gpx, &settings(&["--zoom", "5"])).unwrap();

        assert_eq!(summary.lists, 1);
        assert_eq!(summary.positions_after, 2);
        let points = &gpx.tracks[0].segments[0].points;
        assert_eq!(points[0].point(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_visible_mode_without_viewport_keeps_everything() {
        let mut gpx = sample_gpx(100, 3);
        let summary = reduce_gpx(&mut gpx, &settings(&["--mode", "visible"])).unwrap();
        assert_eq!(summary.positions_before, summary.positions_after);
    }

    #[test]
    fn test_visible_mode_clips_to_viewport() {
        let mut gpx = sample_gpx(1000, 0);
        let summary = reduce_gpx(
            &mut gpx,
            &settings(&[
                "--mode",
                "visible",
                "--threshold",
                "0",
                "--viewport",
                "-0.0005,-1,0.0095,1",
            ]),
        )
        .unwrap();
        // Positions 0..=9 are inside, position 10 is kept as exit point
        assert_eq!(summary.positions_after, 11);
    }

    #[test]
    fn test_significant_mode_keeps_waypoints() {
        let mut gpx = sample_gpx(50, 20);
        let summary = reduce_gpx(&mut gpx, &settings(&["--mode", "significant", "-z", "10"])).unwrap();
        assert_eq!(gpx.tracks[0].segments[0].points.len(), 2);
        assert_eq!(gpx.waypoints.len(), 20);
        assert_eq!(summary.positions_after, 22);
    }

    #[test]
    fn test_invalid_target_count_is_reported() {
        let mut gpx = sample_gpx(100, 0);
        let result = reduce_gpx(&mut gpx, &settings(&["--mode", "every-nth", "-n", "1"]));
        assert!(matches!(
            result,
            Err(CliError::Reduction(ReductionError::InvalidArgument(_)))
        ));
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("out"), Path::new("tracks/ride.gpx")).unwrap();
        assert_eq!(path, Path::new("out").join("ride.gpx"));
        assert!(output_path(Path::new("out"), Path::new("/")).is_err());
    }

    #[test]
    fn test_summary_display() {
        let summary = ReductionSummary {
            lists: 3,
            positions_before: 1200,
            positions_after: 80,
        };
        assert_eq!(summary.to_string(), "3 lists, 1200 -> 80 positions");
    }
}
