//! Builds the meteorological history and tilt inputs of a run from typical-year weather with
//! pre-computed sun positions and an angle-resolved optics table for the module stack.

use crate::core::met_history::{MetChannel, MetHistory};
use crate::core::met_models::{
    check_angle_table, clearness_index, ground_temperature, hemispherical_average,
    interpolate_or_extrapolate, projected_sun_elevation, sky_temperature,
};
use crate::core::units::{Tilt, KELVIN_OFFSET, SECONDS_PER_HOUR};
use crate::errors::AngleTableError;
use crate::input::InputPaths;
use anyhow::bail;
use csv::{ReaderBuilder as CsvReaderBuilder, WriterBuilder};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use strum::{EnumCount, IntoEnumIterator};
use tracing::{debug, info, warn};

/// Irradiance the optics table is normalised to, W/m2.
const REFERENCE_IRRADIANCE: f64 = 1000.;

/// Elapsed time of the first sample, s. Each sample describes the hour ending at its time.
const FIRST_ELAPSED_TIME: f64 = SECONDS_PER_HOUR as f64;

/// One hourly weather record, with the sun position taken halfway through the hour it ends.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeatherSample {
    /// deg C
    pub dry_bulb: f64,
    /// deg C
    pub dew_point: f64,
    /// global horizontal irradiance, W/m2
    pub ghi: f64,
    /// diffuse horizontal irradiance, W/m2
    pub dhi: f64,
    /// direct normal irradiance, W/m2
    pub dni: f64,
    /// extraterrestrial horizontal irradiance, W/m2
    pub extraterrestrial: f64,
    /// m/s
    pub wind_speed: f64,
    /// apparent sun elevation, degrees
    pub apparent_elevation: f64,
    /// sun azimuth east of north, degrees
    pub azimuth: f64,
    /// angle of incidence on the module plane, degrees
    pub angle_of_incidence: f64,
}

/// Fixed-tilt array orientation. Azimuth in degrees east of north.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrayOrientation {
    pub tilt: Tilt,
    pub azimuth: f64,
}

impl Default for ArrayOrientation {
    fn default() -> Self {
        Self {
            tilt: Tilt::new(40.).unwrap_or_default(),
            azimuth: 180.,
        }
    }
}

/// One line of the optics table: absorbed irradiance per layer, in W/m2, for 1000 W/m2 of
/// direct light arriving at `angle` degrees from the module normal.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct OpticsRow {
    pub angle: f64,
    #[serde(rename = "glass_abs_W/m2")]
    pub glass: f64,
    #[serde(rename = "encapsulant_abs_W/m2")]
    pub encapsulant: f64,
    #[serde(rename = "cell_abs_W/m2")]
    pub cell: f64,
    pub current_factor: f64,
}

/// Angle-resolved absorption of the module stack.
#[derive(Clone, Debug, PartialEq)]
pub struct OpticsTable {
    angles: Vec<f64>,
    glass: Vec<f64>,
    encapsulant: Vec<f64>,
    cell: Vec<f64>,
    current_factor: Vec<f64>,
}

/// Absorbed irradiance split into the three layers plus the current derating, as used for
/// both the direct and the diffuse part of the light.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Absorption {
    glass: f64,
    encapsulant: f64,
    cell: f64,
    current_factor: f64,
}

impl OpticsTable {
    /// Tables that stop short of grazing incidence are closed with a dark row at 90 degrees so
    /// extrapolation cannot go negative.
    pub fn new(mut rows: Vec<OpticsRow>) -> Result<Self, AngleTableError> {
        let max_angle = rows.iter().map(|row| row.angle).reduce(f64::max);
        if max_angle.is_some_and(|angle| angle < 85.) {
            warn!("optics table stops short of 85 degrees; absorption up to 90 degrees is extrapolated and may be unphysical");
        }
        if max_angle.is_some_and(|angle| angle < 90.) {
            rows.push(OpticsRow {
                angle: 90.,
                glass: 0.,
                encapsulant: 0.,
                cell: 0.,
                current_factor: 0.,
            });
        }

        let column = |value: fn(&OpticsRow) -> f64| rows.iter().map(value).collect::<Vec<f64>>();
        let table = Self {
            angles: column(|row| row.angle),
            glass: column(|row| row.glass),
            encapsulant: column(|row| row.encapsulant),
            cell: column(|row| row.cell),
            current_factor: column(|row| row.current_factor),
        };
        for values in [
            &table.glass,
            &table.encapsulant,
            &table.cell,
            &table.current_factor,
        ] {
            check_angle_table(&table.angles, values)?;
        }

        Ok(table)
    }

    /// Absorption of isotropic diffuse light.
    fn diffuse(&self) -> Result<Absorption, AngleTableError> {
        Ok(Absorption {
            glass: hemispherical_average(&self.angles, &self.glass)?,
            encapsulant: hemispherical_average(&self.angles, &self.encapsulant)?,
            cell: hemispherical_average(&self.angles, &self.cell)?,
            current_factor: hemispherical_average(&self.angles, &self.current_factor)?,
        })
    }

    /// Absorption of direct light at `angle_of_incidence` degrees, per unit of irradiance on
    /// the module plane (the cosine factor of the table is removed).
    fn direct(&self, angle_of_incidence: f64) -> Absorption {
        let per_plane_irradiance = |values: &[f64]| {
            let unprojected: Vec<f64> = self
                .angles
                .iter()
                .zip(values)
                .map(|(angle, value)| value / angle.to_radians().cos())
                .collect();
            interpolate_or_extrapolate(&self.angles, &unprojected, angle_of_incidence)
        };

        Absorption {
            glass: per_plane_irradiance(&self.glass),
            encapsulant: per_plane_irradiance(&self.encapsulant),
            cell: per_plane_irradiance(&self.cell),
            current_factor: per_plane_irradiance(&self.current_factor),
        }
    }
}

/// Read the optics table: a header row naming `angle`, `glass_abs_W/m2`,
/// `encapsulant_abs_W/m2`, `cell_abs_W/m2` and `current_factor`, then one row per angle.
pub fn optics_from_reader(file: impl Read) -> anyhow::Result<OpticsTable> {
    let mut reader = CsvReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);
    let rows = reader
        .deserialize::<OpticsRow>()
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OpticsTable::new(rows)?)
}

/// Read hourly weather samples from a CSV file with a header row naming the fields of
/// [`WeatherSample`].
pub fn weather_from_reader(file: impl Read) -> anyhow::Result<Vec<WeatherSample>> {
    let mut reader = CsvReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    Ok(reader
        .deserialize::<WeatherSample>()
        .collect::<Result<Vec<_>, _>>()?)
}

/// Derive every channel of the meteorological history from hourly weather. The first sample
/// lands at an elapsed time of one hour.
pub fn generate_met_history(
    weather: &[WeatherSample],
    optics: &OpticsTable,
    orientation: ArrayOrientation,
) -> anyhow::Result<MetHistory> {
    if weather.len() < 2 {
        bail!(
            "{} weather samples given, at least 2 are needed to interpolate",
            weather.len()
        );
    }
    let diffuse_absorption = optics.diffuse()?;
    let tilt = orientation.tilt.radians();

    let times = (0..weather.len())
        .map(|i| FIRST_ELAPSED_TIME + i as f64 * SECONDS_PER_HOUR as f64)
        .collect();
    let mut channels: Vec<Vec<f64>> = vec![Vec::with_capacity(weather.len()); MetChannel::COUNT];

    for (i, sample) in weather.iter().enumerate() {
        let fields = [
            sample.dry_bulb,
            sample.dew_point,
            sample.ghi,
            sample.dhi,
            sample.dni,
            sample.extraterrestrial,
            sample.wind_speed,
            sample.apparent_elevation,
            sample.azimuth,
            sample.angle_of_incidence,
        ];
        if fields.iter().any(|field| !field.is_finite()) {
            bail!("weather sample {} holds a non-finite value", i + 1);
        }

        let beam = (sample.dni * sample.angle_of_incidence.to_radians().cos()).max(0.);
        let sky_diffuse = sample.dhi * (1. + tilt.cos()) / 2.;
        let poai = beam + sky_diffuse;
        let direct = optics.direct(sample.angle_of_incidence);
        let absorbed = |direct: f64, diffuse: f64| {
            (direct * beam + diffuse * sky_diffuse) / REFERENCE_IRRADIANCE
        };
        let current_factor = (direct.current_factor * beam
            + diffuse_absorption.current_factor * sky_diffuse)
            / poai;

        for (channel, values) in MetChannel::iter().zip(channels.iter_mut()) {
            values.push(match channel {
                MetChannel::Temp => sample.dry_bulb + KELVIN_OFFSET,
                MetChannel::TempSky => sky_temperature(
                    sample.dew_point,
                    clearness_index(sample.ghi, sample.extraterrestrial),
                    sample.dry_bulb,
                ),
                MetChannel::TempGround => ground_temperature(sample.dry_bulb, sample.ghi),
                MetChannel::Poai => poai,
                MetChannel::Dni => sample.dni,
                MetChannel::WindSpeed => sample.wind_speed,
                MetChannel::ElevationProjected => projected_sun_elevation(
                    sample.apparent_elevation.to_radians(),
                    sample.azimuth.to_radians(),
                    orientation.azimuth.to_radians(),
                ),
                MetChannel::AbsGlass => absorbed(direct.glass, diffuse_absorption.glass),
                MetChannel::AbsEncapsulant => {
                    absorbed(direct.encapsulant, diffuse_absorption.encapsulant)
                }
                MetChannel::AbsCell => absorbed(direct.cell, diffuse_absorption.cell),
                // dark hours carry no current
                MetChannel::CurrentFactor if !current_factor.is_finite() => 0.,
                MetChannel::CurrentFactor => current_factor,
            });
        }
    }
    debug!("derived {} meteorological samples", weather.len());

    Ok(MetHistory::new(times, channels))
}

/// Write the meteorological history in the layout the model reads back: a header row, then
/// elapsed time followed by one column per channel.
pub fn write_met_history(history: &MetHistory, writer: impl Write) -> anyhow::Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);

    let mut header = vec!["elapsed"];
    header.extend(MetChannel::iter().map(|channel| channel.function_name()));
    writer.write_record(&header)?;

    for (i, time) in history.times().iter().enumerate() {
        let mut record = vec![time.to_string()];
        record.extend(
            MetChannel::iter().map(|channel| history.channel(channel)[i].to_string()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}

pub fn write_tilt(tilt: Tilt, mut writer: impl Write) -> anyhow::Result<()> {
    write!(writer, "{tilt}")?;
    writer.flush()?;

    Ok(())
}

/// Generate both input files of a run at the locations in `paths`.
pub fn write_met_inputs(
    paths: &InputPaths,
    weather: &[WeatherSample],
    optics: &OpticsTable,
    orientation: ArrayOrientation,
) -> anyhow::Result<MetHistory> {
    let history = generate_met_history(weather, optics, orientation)?;

    write_met_history(&history, BufWriter::new(File::create(&paths.met_history)?))?;
    write_tilt(orientation.tilt, File::create(&paths.tilt_file)?)?;
    info!(
        "wrote {} meteorological samples to {} and tilt {} degrees to {}",
        history.len(),
        paths.met_history.display(),
        orientation.tilt,
        paths.tilt_file.display()
    );

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::read_tilt_file;
    use crate::read_met_file::met_history_from_file;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    const OPTICS_CSV: &str = "\
angle,glass_abs_W/m2,encapsulant_abs_W/m2,cell_abs_W/m2,current_factor
0,30,20,800,1
60,20,10,350,0.45
80,10,5,100,0.15
";

    #[fixture]
    fn optics() -> OpticsTable {
        optics_from_reader(Cursor::new(OPTICS_CSV)).unwrap()
    }

    #[fixture]
    fn weather() -> Vec<WeatherSample> {
        let night = WeatherSample {
            dry_bulb: 5.,
            dew_point: -2.,
            ghi: 0.,
            dhi: 0.,
            dni: 0.,
            extraterrestrial: 0.,
            wind_speed: 1.5,
            apparent_elevation: -20.,
            azimuth: 30.,
            angle_of_incidence: 120.,
        };
        let noon = WeatherSample {
            dry_bulb: 25.,
            dew_point: 10.,
            ghi: 800.,
            dhi: 100.,
            dni: 900.,
            extraterrestrial: 1200.,
            wind_speed: 3.,
            apparent_elevation: 50.,
            azimuth: 180.,
            angle_of_incidence: 0.,
        };
        vec![night, noon]
    }

    #[rstest]
    fn test_optics_table_is_closed_at_grazing_incidence(optics: OpticsTable) {
        assert_eq!(optics.angles, vec![0., 60., 80., 90.]);
        assert_eq!(optics.cell, vec![800., 350., 100., 0.]);
    }

    #[rstest]
    fn test_optics_table_needs_two_angles() {
        let rows = vec![OpticsRow {
            angle: 90.,
            glass: 0.,
            encapsulant: 0.,
            cell: 0.,
            current_factor: 0.,
        }];

        assert_eq!(
            OpticsTable::new(rows),
            Err(AngleTableError::TooFewAngles { found: 1 })
        );
    }

    #[rstest]
    fn test_generated_channels(weather: Vec<WeatherSample>, optics: OpticsTable) {
        let orientation = ArrayOrientation {
            tilt: Tilt::new(0.).unwrap(),
            azimuth: 180.,
        };

        let history = generate_met_history(&weather, &optics, orientation).unwrap();

        assert_eq!(history.times(), &[3600., 7200.]);
        assert_relative_eq!(history.channel(MetChannel::Temp)[0], 278.15, epsilon = 1e-9);
        assert_relative_eq!(history.channel(MetChannel::Temp)[1], 298.15, epsilon = 1e-9);
        assert_eq!(history.channel(MetChannel::Poai), &[0., 1000.]);
        assert_eq!(history.channel(MetChannel::ElevationProjected)[0], 0.);
        assert_relative_eq!(
            history.channel(MetChannel::ElevationProjected)[1],
            50_f64.to_radians(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            history.channel(MetChannel::TempGround)[1],
            ground_temperature(25., 800.),
            max_relative = 1e-12
        );

        // night: nothing absorbed and no current
        for channel in [
            MetChannel::AbsGlass,
            MetChannel::AbsEncapsulant,
            MetChannel::AbsCell,
            MetChannel::CurrentFactor,
        ] {
            assert_eq!(history.channel(channel)[0], 0.);
        }

        let diffuse_cell = hemispherical_average(&optics.angles, &optics.cell).unwrap();
        assert_relative_eq!(
            history.channel(MetChannel::AbsCell)[1],
            (800. * 900. + diffuse_cell * 100.) / 1000.,
            max_relative = 1e-12
        );
        let diffuse_current =
            hemispherical_average(&optics.angles, &optics.current_factor).unwrap();
        assert_relative_eq!(
            history.channel(MetChannel::CurrentFactor)[1],
            (900. + diffuse_current * 100.) / 1000.,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn test_generation_needs_two_samples(weather: Vec<WeatherSample>, optics: OpticsTable) {
        let error =
            generate_met_history(&weather[..1], &optics, ArrayOrientation::default()).unwrap_err();

        assert!(error.to_string().contains("at least 2"));
    }

    #[rstest]
    fn test_generated_inputs_are_read_back(weather: Vec<WeatherSample>, optics: OpticsTable) {
        let dir = std::env::temp_dir().join(format!("pvtherm-met-input-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let paths = InputPaths::in_directory(&dir);
        let orientation = ArrayOrientation {
            tilt: Tilt::new(25.).unwrap(),
            azimuth: 180.,
        };

        let written = write_met_inputs(&paths, &weather, &optics, orientation).unwrap();
        let read = met_history_from_file(&paths.met_history).unwrap();

        assert_eq!(read_tilt_file(&paths.tilt_file).unwrap(), orientation.tilt);
        assert_eq!(read.times(), written.times());
        for channel in MetChannel::iter() {
            assert_eq!(read.channel(channel), written.channel(channel), "{channel:?}");
        }
        let contents = std::fs::read_to_string(&paths.met_history).unwrap();
        assert!(contents.starts_with("elapsed,temp,temp_sky,temp_ground,poai,"));
    }

    #[rstest]
    fn test_weather_is_read_by_field_name() {
        let csv = "\
dry_bulb,dew_point,ghi,dhi,dni,extraterrestrial,wind_speed,apparent_elevation,azimuth,angle_of_incidence
25,10,800,100,900,1200,3,50,180,0
";

        let weather = weather_from_reader(Cursor::new(csv)).unwrap();

        assert_eq!(weather.len(), 1);
        assert_eq!(weather[0].dni, 900.);
        assert_eq!(weather[0].angle_of_incidence, 0.);
    }
}
