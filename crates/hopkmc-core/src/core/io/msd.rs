use super::traits::{TableIoError, TabularFile, join_list, parse_list, split_header, write_header};
use crate::analysis::msd::{MsdBin, MsdRecord};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

#[derive(Debug, Serialize, Deserialize)]
struct MsdRow {
    time: f64,
    msd: Option<f64>,
    samples: usize,
}

impl TabularFile for MsdRecord {
    type Error = TableIoError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self, Self::Error> {
        let (metadata, body) = split_header(reader)?;
        let mut csv_reader = csv::Reader::from_reader(body.as_bytes());
        let bins = csv_reader
            .deserialize::<MsdRow>()
            .map(|row| {
                row.map(|r| MsdBin {
                    time: r.time,
                    msd: r.msd,
                    samples: r.samples,
                })
            })
            .collect::<Result<Vec<_>, csv::Error>>()?;
        // The first bin is centered at half a bin width.
        let bin_size = match metadata.get("bin-size") {
            Some(value) => value
                .parse::<f64>()
                .map_err(|_| TableIoError::InvalidMetadata {
                    key: "bin-size",
                    value: value.clone(),
                })?,
            None => bins.first().map_or(0.0, |b| 2.0 * b.time),
        };
        Ok(MsdRecord {
            bins,
            species: parse_list(metadata.get("species")),
            bin_size,
        })
    }

    fn write_to(&self, writer: &mut impl Write) -> Result<(), Self::Error> {
        write_header(
            writer,
            &[
                ("species", join_list(&self.species)),
                ("bin-size", self.bin_size.to_string()),
            ],
        )?;
        let mut csv_writer = csv::Writer::from_writer(writer);
        for bin in &self.bins {
            csv_writer.serialize(MsdRow {
                time: bin.time,
                msd: bin.msd,
                samples: bin.samples,
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
