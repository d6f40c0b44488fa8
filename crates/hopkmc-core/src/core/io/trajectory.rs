use super::traits::{TableIoError, TabularFile, join_list, parse_list, split_header, write_header};
use crate::core::models::trajectory::{Checkpoint, Trajectory};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "traj_";
const FILE_EXTENSION: &str = ".csv";

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointRow {
    time: f64,
    dx: f64,
    dy: f64,
    dz: f64,
}

/// File name of trajectory `index` inside an output directory.
pub fn trajectory_file_name(index: usize) -> String {
    format!("{FILE_PREFIX}{index:04}{FILE_EXTENSION}")
}

/// Writes each `(index, trajectory)` pair to its own file in `dir`, creating the directory.
pub fn write_directory<'t>(
    dir: &Path,
    trajectories: impl IntoIterator<Item = (usize, &'t Trajectory)>,
) -> Result<Vec<PathBuf>, TableIoError> {
    fs::create_dir_all(dir)?;
    trajectories
        .into_iter()
        .map(|(index, trajectory)| {
            let path = dir.join(trajectory_file_name(index));
            trajectory.write_to_path(&path)?;
            Ok(path)
        })
        .collect()
}

/// Reads every `traj_*.csv` file in `dir`, in file-name order.
pub fn read_directory(dir: &Path) -> Result<Vec<Trajectory>, TableIoError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION))
        })
        .collect();
    paths.sort();
    paths.iter().map(Trajectory::read_from_path).collect()
}

impl TabularFile for Trajectory {
    type Error = TableIoError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self, Self::Error> {
        let (metadata, body) = split_header(reader)?;
        let mut csv_reader = csv::Reader::from_reader(body.as_bytes());
        let checkpoints = csv_reader
            .deserialize::<CheckpointRow>()
            .map(|row| {
                row.map(|r| Checkpoint {
                    time: r.time,
                    displacement: Vector3::new(r.dx, r.dy, r.dz),
                })
            })
            .collect::<Result<Vec<_>, csv::Error>>()?;
        Ok(Trajectory::from_checkpoints(
            checkpoints,
            parse_list(metadata.get("species")),
        ))
    }

    fn write_to(&self, writer: &mut impl Write) -> Result<(), Self::Error> {
        write_header(writer, &[("species", join_list(self.species()))])?;
        let mut csv_writer = csv::Writer::from_writer(writer);
        for checkpoint in self.checkpoints() {
            csv_writer.serialize(CheckpointRow {
                time: checkpoint.time,
                dx: checkpoint.displacement.x,
                dy: checkpoint.displacement.y,
                dz: checkpoint.displacement.z,
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
